//! Camera

use crate::geometry::Ray;
use crate::rng::RngStream;

/// Generates primary rays.
pub trait Camera: Send + Sync {
    /// Returns the camera ray for a sample of a pixel. A zero extent ray means the sample does not map to the image
    /// and is written as black.
    ///
    /// * `rng`     - Random stream of the sample.
    /// * `sample`  - Sample number.
    /// * `pixel_x` - Pixel x-coordinate in the image.
    /// * `pixel_y` - Pixel y-coordinate in the image.
    fn generate_initial_ray(&self, rng: &mut RngStream, sample: u32, pixel_x: u32, pixel_y: u32) -> Ray;
}
