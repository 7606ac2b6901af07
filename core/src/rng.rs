//! Random Number Generator.

use crate::math::*;

/// 32-bit precision value for 1 - epsilon.
pub const FLOAT_ONE_MINUS_EPSILON: f32 = hexf32!("0x1.fffffep-1"); // 0.99999994

/// 1 - epsilon in the precision we've selected for `Float`.
pub const ONE_MINUS_EPSILON: Float = FLOAT_ONE_MINUS_EPSILON;

const PCG32_DEFAULT_STATE: u64 = 0x853c49e6748fea9b;
const PCG32_DEFAULT_STREAM: u64 = 0xda3e39cb94b95bdb;
const PCG32_MULT: u64 = 0x5851f42d4c957f2d;

/// Implements the PCG32 pseudo-random number generator.
#[derive(Clone, Debug, PartialEq)]
pub struct RNG {
    state: u64,
    inc: u64,
}

impl Default for RNG {
    /// Return a new instance of `RNG` with default state and stream.
    fn default() -> Self {
        Self {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
}

impl RNG {
    /// Create a new `RNG` by seeding it with the given starting sequence.
    ///
    /// * `sequence_index` - The starting sequence to seed with.
    pub fn new(sequence_index: u64) -> Self {
        let mut ret = Self { state: 0, inc: 0 };
        ret.set_sequence(sequence_index);
        ret
    }

    /// Initialize the random number generator sequence.
    ///
    /// * `init_seq` - The starting sequence to seed with.
    #[inline(always)]
    fn set_sequence(&mut self, init_seq: u64) {
        self.state = 0;
        self.inc = init_seq.wrapping_shl(1) | 1;
        let _ = self.uniform_u32();

        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        let _ = self.uniform_u32();
    }

    /// Returns a uniformly distributed u32 value.
    #[inline(always)]
    pub fn uniform_u32(&mut self) -> u32 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);

        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;

        xor_shifted.rotate_right(rot)
    }

    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    pub fn uniform_float(&mut self) -> Float {
        min(
            self.uniform_u32() as Float * hexf32!("0x1.0p-32") as Float,
            FLOAT_ONE_MINUS_EPSILON,
        )
    }
}

/// Per-slot random stream. The stream is derived from the pixel seed, the pixel and the sample number only, so a
/// sample draws the same numbers regardless of which slot traces it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RngStream {
    /// Underlying generator.
    rng: RNG,

    /// Number of dimensions consumed so far.
    dimension: u32,
}

impl RngStream {
    /// Start the random stream for a sample.
    ///
    /// * `seed`    - Per-pixel seed from the host rng state buffer.
    /// * `sample`  - Sample number.
    /// * `pixel_x` - Pixel x-coordinate.
    /// * `pixel_y` - Pixel y-coordinate.
    pub fn new(seed: u32, sample: u32, pixel_x: u32, pixel_y: u32) -> Self {
        let pixel = hash_u32(pixel_x ^ hash_u32(pixel_y));
        let sequence = ((seed as u64) << 32) | hash_u32(pixel ^ hash_u32(sample)) as u64;
        Self {
            rng: RNG::new(sequence),
            dimension: 0,
        }
    }

    /// Returns the sample value for the next dimension.
    pub fn get_1d(&mut self) -> Float {
        self.dimension += 1;
        self.rng.uniform_float()
    }

    /// Returns the sample values for the next two dimensions.
    pub fn get_2d(&mut self) -> (Float, Float) {
        let u = self.get_1d();
        let v = self.get_1d();
        (u, v)
    }

    /// Returns the number of dimensions consumed so far.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_sequence_is_reproducible() {
        let mut a = RNG::new(42);
        let mut b = RNG::new(42);
        for _ in 0..16 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }

    #[test]
    fn stream_depends_on_sample() {
        let mut a = RngStream::new(7, 0, 3, 4);
        let mut b = RngStream::new(7, 1, 3, 4);
        let va: Vec<Float> = (0..4).map(|_| a.get_1d()).collect();
        let vb: Vec<Float> = (0..4).map(|_| b.get_1d()).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn stream_counts_dimensions() {
        let mut s = RngStream::new(1, 2, 3, 4);
        s.get_1d();
        s.get_2d();
        assert_eq!(s.dimension(), 3);
    }

    proptest! {
        #[test]
        fn uniform_float_in_unit_interval(seq in 0..u64::MAX) {
            let mut rng = RNG::new(seq);
            for _ in 0..8 {
                let v = rng.uniform_float();
                prop_assert!((0.0..1.0).contains(&v));
            }
        }
    }
}
