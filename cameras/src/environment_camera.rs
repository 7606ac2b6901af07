//! Environment Camera

use crate::camera_data::*;
use wavefront_core::camera::*;
use wavefront_core::geometry::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;

// Environment camera.
pub struct EnvironmentCamera {
    /// Common camera parameters.
    pub data: CameraData,
}

impl EnvironmentCamera {
    /// Create a new environment camera.
    ///
    /// * `data` - Common camera parameters.
    pub fn new(data: CameraData) -> Self {
        Self { data }
    }
}

impl Camera for EnvironmentCamera {
    /// Returns a ray covering the whole sphere in latitude/longitude layout.
    fn generate_initial_ray(&self, rng: &mut RngStream, _sample: u32, pixel_x: u32, pixel_y: u32) -> Ray {
        let s = self.data.sample(rng, pixel_x, pixel_y);

        // Compute environment camera ray direction.
        let theta = PI * s.film_y / self.data.height();
        let phi = TWO_PI * s.film_x / self.data.width();
        let dir = Vector3f::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());

        self.data.world_ray(dir, s.time)
    }
}
