//! Pass layout

use crate::config::PassFlags;

/// Width of the combined RGBA pass.
pub const COMBINED_WIDTH: usize = 4;

/// Float offsets of every enabled pass within one sample record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassLayout {
    /// Enabled optional passes.
    pub flags: PassFlags,

    /// Number of floats per sample record.
    pub pass_stride: usize,

    pub emission: Option<usize>,
    pub background: Option<usize>,
    pub direct: Option<usize>,
    pub indirect: Option<usize>,
    pub sample_count: Option<usize>,
    pub debug: Option<usize>,
}

impl PassLayout {
    /// Lay out the combined pass followed by the enabled optional passes.
    ///
    /// * `flags` - Optional passes to record.
    pub fn new(flags: PassFlags) -> Self {
        let mut stride = COMBINED_WIDTH;
        let mut place = |flag: PassFlags, width: usize| {
            flags.contains(flag).then(|| {
                let offset = stride;
                stride += width;
                offset
            })
        };

        let emission = place(PassFlags::EMISSION, 3);
        let background = place(PassFlags::BACKGROUND, 3);
        let direct = place(PassFlags::DIRECT, 3);
        let indirect = place(PassFlags::INDIRECT, 3);
        let sample_count = place(PassFlags::SAMPLE_COUNT, 1);
        let debug = place(PassFlags::DEBUG, 3);

        Self {
            flags,
            pass_stride: stride,
            emission,
            background,
            direct,
            indirect,
            sample_count,
            debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_only() {
        let layout = PassLayout::new(PassFlags::empty());
        assert_eq!(layout.pass_stride, 4);
        assert_eq!(layout.sample_count, None);
    }

    #[test]
    fn optional_passes_follow_combined() {
        let layout = PassLayout::new(PassFlags::BACKGROUND | PassFlags::SAMPLE_COUNT | PassFlags::DEBUG);
        assert_eq!(layout.background, Some(4));
        assert_eq!(layout.sample_count, Some(7));
        assert_eq!(layout.debug, Some(8));
        assert_eq!(layout.emission, None);
        assert_eq!(layout.pass_stride, 11);

        let all = PassLayout::new(PassFlags::all());
        assert_eq!(all.pass_stride, 4 + 4 * 3 + 1 + 3);
        assert_eq!(all.indirect, Some(13));
    }
}
