//! Path Radiance

use crate::config::KernelData;
use crate::math::*;
use crate::spectrum::*;

/// Radiance accumulated by a path. With light passes enabled the contributions are kept in separate buckets so they
/// can be written to their own passes; otherwise everything lands in `emission`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathRadiance {
    /// Split contributions into buckets.
    pub use_light_pass: bool,

    /// Emission seen directly by the camera, or all radiance without light passes.
    pub emission: Spectrum,

    /// Background seen directly by the camera.
    pub background: Spectrum,

    /// Radiance found after one bounce.
    pub direct: Spectrum,

    /// Radiance found after more than one bounce.
    pub indirect: Spectrum,

    /// Running estimate of background visibility used for alpha.
    pub transparent: Float,
}

impl PathRadiance {
    /// Create an empty accumulator.
    ///
    /// * `use_light_pass` - Split contributions into buckets.
    pub fn new(use_light_pass: bool) -> Self {
        Self {
            use_light_pass,
            ..Self::default()
        }
    }

    /// Reset the accumulator for a new sample.
    ///
    /// * `use_light_pass` - Split contributions into buckets.
    pub fn init(&mut self, use_light_pass: bool) {
        *self = Self::new(use_light_pass);
    }

    /// Accumulate emission from a surface or lamp.
    ///
    /// * `throughput` - Path weight.
    /// * `value`      - Emitted radiance.
    /// * `bounce`     - Bounce at which the emitter was found.
    pub fn accum_emission(&mut self, throughput: Spectrum, value: Spectrum, bounce: u32) {
        let contribution = throughput * value;
        match (self.use_light_pass, bounce) {
            (false, _) | (true, 0) => self.emission += contribution,
            (true, 1) => self.direct += contribution,
            (true, _) => self.indirect += contribution,
        }
    }

    /// Accumulate radiance from the background.
    ///
    /// * `throughput` - Path weight.
    /// * `value`      - Background radiance.
    /// * `bounce`     - Bounce at which the path left the scene.
    pub fn accum_background(&mut self, throughput: Spectrum, value: Spectrum, bounce: u32) {
        let contribution = throughput * value;
        match (self.use_light_pass, bounce) {
            (false, _) => self.emission += contribution,
            (true, 0) => self.background += contribution,
            (true, 1) => self.direct += contribution,
            (true, _) => self.indirect += contribution,
        }
    }

    /// Add transparency for a camera ray that left the scene.
    ///
    /// * `throughput` - Path weight.
    pub fn accum_transparent(&mut self, throughput: Spectrum) {
        self.transparent += throughput.average();
    }

    /// Returns the alpha of the sample.
    pub fn alpha(&self) -> Float {
        1.0 - self.transparent
    }

    /// Returns the total radiance of the sample with the sample clamps applied. Non-finite sums are replaced by black.
    ///
    /// * `kd` - Scene constants.
    pub fn clamp_and_sum(&self, kd: &KernelData) -> Spectrum {
        let sum = if self.use_light_pass {
            let mut direct = self.emission + self.direct;
            if !kd.background.transparent {
                direct += self.background;
            }
            let direct = clamp_sum(direct, kd.integrator.sample_clamp_direct);
            let indirect = clamp_sum(self.indirect, kd.integrator.sample_clamp_indirect);
            direct + indirect
        } else {
            self.emission
        };

        if sum.is_finite() {
            sum
        } else {
            warn!("Non-finite radiance value {sum} returned for a sample. Setting to black.");
            Spectrum::ZERO
        }
    }
}

/// Scale `l` so the sum of its channels does not exceed `clamp`. A `clamp` of 0 disables clamping.
fn clamp_sum(l: Spectrum, clamp: Float) -> Spectrum {
    let sum = l.abs_sum();
    if clamp > 0.0 && sum > clamp {
        l * (clamp / sum)
    } else {
        l
    }
}
