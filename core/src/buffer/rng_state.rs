//! Random number state buffer

use crate::config::LaunchConfig;
use crate::math::hash_u32;
use crate::rng::RngStream;
use std::sync::atomic::{AtomicU32, Ordering};

/// Host owned per pixel random number seeds. Finished samples record how many random dimensions they consumed.
pub struct RngStateBuffer {
    /// Image width in pixels.
    width: usize,

    /// Image height in pixels.
    height: usize,

    /// Per pixel seeds.
    seeds: Vec<u32>,

    /// Largest number of dimensions consumed by a sample of each pixel.
    max_dimension: Vec<AtomicU32>,
}

impl RngStateBuffer {
    /// Create seeds for an image.
    ///
    /// * `width`  - Image width.
    /// * `height` - Image height.
    /// * `seed`   - Global seed.
    pub fn new(width: usize, height: usize, seed: u32) -> Self {
        let n = width * height;
        Self {
            width,
            height,
            seeds: (0..n as u32).map(|i| hash_u32(i ^ hash_u32(seed))).collect(),
            max_dimension: (0..n).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    /// Check that a tile fits the buffer.
    ///
    /// * `config` - Launch configuration of the tile.
    pub fn validate_for(&self, config: &LaunchConfig) -> Result<(), String> {
        if config.x + config.width > self.width || config.y + config.height > self.height {
            Err(format!(
                "Tile {}x{} at ({}, {}) does not fit rng state {}x{}",
                config.width, config.height, config.x, config.y, self.width, self.height
            ))
        } else {
            Ok(())
        }
    }

    /// Returns the seed of a pixel.
    ///
    /// * `x` - Pixel x-coordinate.
    /// * `y` - Pixel y-coordinate.
    pub fn seed(&self, x: u32, y: u32) -> u32 {
        self.seeds[self.index(x, y)]
    }

    /// Start the random stream of a sample.
    ///
    /// * `sample` - Sample number.
    /// * `x`      - Pixel x-coordinate.
    /// * `y`      - Pixel y-coordinate.
    pub fn stream(&self, sample: u32, x: u32, y: u32) -> RngStream {
        RngStream::new(self.seed(x, y), sample, x, y)
    }

    /// Record the end of a sample's random stream.
    ///
    /// * `x`   - Pixel x-coordinate.
    /// * `y`   - Pixel y-coordinate.
    /// * `rng` - The finished stream.
    pub fn end_stream(&self, x: u32, y: u32, rng: &RngStream) {
        self.max_dimension[self.index(x, y)].fetch_max(rng.dimension(), Ordering::AcqRel);
    }

    /// Returns the largest number of dimensions a finished sample of the pixel consumed.
    ///
    /// * `x` - Pixel x-coordinate.
    /// * `y` - Pixel y-coordinate.
    pub fn max_dimension(&self, x: u32, y: u32) -> u32 {
        self.max_dimension[self.index(x, y)].load(Ordering::Acquire)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_differ_between_pixels() {
        let buffer = RngStateBuffer::new(4, 4, 7);
        assert_ne!(buffer.seed(0, 0), buffer.seed(1, 0));
        assert_eq!(buffer.seed(2, 3), RngStateBuffer::new(4, 4, 7).seed(2, 3));
        assert_ne!(buffer.seed(2, 3), RngStateBuffer::new(4, 4, 8).seed(2, 3));
    }

    #[test]
    fn end_stream_keeps_largest_dimension() {
        let buffer = RngStateBuffer::new(2, 2, 0);
        let mut a = buffer.stream(0, 1, 1);
        a.get_2d();
        buffer.end_stream(1, 1, &a);

        let mut b = buffer.stream(1, 1, 1);
        b.get_1d();
        buffer.end_stream(1, 1, &b);

        assert_eq!(buffer.max_dimension(1, 1), 2);
        assert_eq!(buffer.max_dimension(0, 0), 0);
    }
}
