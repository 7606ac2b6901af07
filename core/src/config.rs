//! Launch configuration and scene constants

use crate::math::*;
use bitflags::bitflags;

bitflags! {
    /// Optional output passes recorded next to the combined RGBA pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PassFlags: u32 {
        const EMISSION = 1;
        const BACKGROUND = 2;
        const DIRECT = 4;
        const INDIRECT = 8;
        const SAMPLE_COUNT = 16;
        const DEBUG = 32;

        /// Passes that require radiance to be split into separate buckets.
        const LIGHT = Self::EMISSION.bits() | Self::BACKGROUND.bits() | Self::DIRECT.bits() | Self::INDIRECT.bits();
    }
}

/// Film constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilmData {
    /// Enabled optional passes.
    pub pass_flags: PassFlags,
}

impl FilmData {
    /// Returns true if radiance is split into emission/background/direct/indirect buckets.
    pub fn use_light_pass(&self) -> bool {
        self.pass_flags.intersects(PassFlags::LIGHT)
    }
}

/// Background constants.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BackgroundData {
    /// Camera rays that miss the scene leave the pixel transparent.
    pub transparent: bool,
}

/// Integrator constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegratorData {
    /// Weight emission found by continuation rays with multiple importance sampling.
    pub use_lamp_mis: bool,

    /// Clamp applied to the direct contribution of a sample. 0 disables clamping.
    pub sample_clamp_direct: Float,

    /// Clamp applied to the indirect contribution of a sample. 0 disables clamping.
    pub sample_clamp_indirect: Float,

    /// Paths are terminated after this many bounces.
    pub max_bounce: u32,
}

/// Scene wide constants shared by every stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelData {
    pub film: FilmData,
    pub background: BackgroundData,
    pub integrator: IntegratorData,
}

impl Default for KernelData {
    fn default() -> Self {
        Self {
            film: FilmData {
                pass_flags: PassFlags::SAMPLE_COUNT,
            },
            background: BackgroundData::default(),
            integrator: IntegratorData {
                use_lamp_mis: true,
                sample_clamp_direct: 0.0,
                sample_clamp_indirect: 0.0,
                max_bounce: 4,
            },
        }
    }
}

/// Launch configuration for one tile. It stays immutable for all dispatches that render the tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Tile width in pixels.
    pub width: usize,

    /// Tile height in pixels.
    pub height: usize,

    /// Tile origin x-coordinate in the output buffer.
    pub x: usize,

    /// Tile origin y-coordinate in the output buffer.
    pub y: usize,

    /// Row stride of the output buffer in pixels.
    pub stride: usize,

    /// Number of slots per pixel.
    pub parallel_samples: usize,

    /// First sample (inclusive).
    pub start_sample: u32,

    /// Last sample (exclusive).
    pub end_sample: u32,

    /// Capacity of each queue.
    pub queue_capacity: usize,

    /// Stages dequeue slots from queues instead of visiting every slot.
    pub use_queues: bool,
}

impl LaunchConfig {
    /// Create a launch configuration for a tile with queues sized to the slot count.
    ///
    /// * `x`                - Tile origin x-coordinate.
    /// * `y`                - Tile origin y-coordinate.
    /// * `width`            - Tile width.
    /// * `height`           - Tile height.
    /// * `stride`           - Row stride of the output buffer.
    /// * `parallel_samples` - Number of slots per pixel.
    /// * `start_sample`     - First sample (inclusive).
    /// * `end_sample`       - Last sample (exclusive).
    #[allow(clippy::too_many_arguments)]
    pub fn for_tile(
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        stride: usize,
        parallel_samples: usize,
        start_sample: u32,
        end_sample: u32,
    ) -> Self {
        Self {
            width,
            height,
            x,
            y,
            stride,
            parallel_samples,
            start_sample,
            end_sample,
            queue_capacity: width * height * parallel_samples,
            use_queues: false,
        }
    }

    /// Returns a copy with the queue mode flag replaced.
    ///
    /// * `use_queues` - Stages dequeue slots from queues.
    pub fn with_use_queues(self, use_queues: bool) -> Self {
        Self { use_queues, ..self }
    }

    /// Returns the number of ray slots needed for the tile.
    pub fn num_slots(&self) -> usize {
        self.width * self.height * self.parallel_samples
    }

    /// Returns the number of samples rendered per pixel.
    pub fn num_samples(&self) -> u32 {
        self.end_sample.saturating_sub(self.start_sample)
    }

    /// Check the configuration for problems the host can fix.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Tile {}x{} has no pixels", self.width, self.height));
        }
        if self.parallel_samples == 0 {
            return Err(String::from("Parallel samples must be at least 1"));
        }
        if self.start_sample >= self.end_sample {
            return Err(format!(
                "Sample range [{}, {}) is empty",
                self.start_sample, self.end_sample
            ));
        }
        if self.stride < self.x + self.width {
            return Err(format!(
                "Buffer stride {} is smaller than tile extent {}",
                self.stride,
                self.x + self.width
            ));
        }
        if self.queue_capacity < self.num_slots() {
            return Err(format!(
                "Queue capacity {} is below slot count {}",
                self.queue_capacity,
                self.num_slots()
            ));
        }
        if self.num_slots() > u32::MAX as usize - 1 {
            return Err(format!("Slot count {} does not fit a queue entry", self.num_slots()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_tile_sizes_queues_to_slots() {
        let config = LaunchConfig::for_tile(0, 0, 4, 2, 4, 2, 0, 8);
        assert_eq!(config.num_slots(), 16);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.num_samples(), 8);
        assert!(!config.use_queues);
        assert!(config.with_use_queues(true).use_queues);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_configs() {
        let ok = LaunchConfig::for_tile(4, 0, 4, 4, 8, 1, 0, 4);
        assert!(ok.validate().is_ok());

        assert!(LaunchConfig { width: 0, ..ok }.validate().is_err());
        assert!(LaunchConfig { parallel_samples: 0, ..ok }.validate().is_err());
        assert!(LaunchConfig { start_sample: 4, ..ok }.validate().is_err());
        assert!(LaunchConfig { stride: 7, ..ok }.validate().is_err());
        assert!(LaunchConfig { queue_capacity: 15, ..ok }.validate().is_err());
    }

    #[test]
    fn light_pass_follows_flags() {
        let mut film = FilmData {
            pass_flags: PassFlags::SAMPLE_COUNT | PassFlags::DEBUG,
        };
        assert!(!film.use_light_pass());
        film.pass_flags |= PassFlags::BACKGROUND;
        assert!(film.use_light_pass());
    }
}
