//! Fisheye Camera

use crate::camera_data::*;
use wavefront_core::camera::*;
use wavefront_core::geometry::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;

/// Equidistant fisheye camera. The image circle fills the shorter image axis; samples outside it get a zero extent
/// ray.
pub struct FisheyeCamera {
    /// Common camera parameters.
    pub data: CameraData,

    /// Field of view in radians across the image circle.
    pub fov: Float,
}

impl FisheyeCamera {
    /// Create a new fisheye camera.
    ///
    /// * `data` - Common camera parameters.
    /// * `fov`  - Field of view across the image circle in degrees.
    pub fn new(data: CameraData, fov: Float) -> Result<Self, String> {
        if !(fov > 0.0 && fov <= 360.0) {
            return Err(format!("Fisheye field of view {fov} must be in (0, 360] degrees"));
        }
        Ok(Self {
            data,
            fov: fov.to_radians(),
        })
    }
}

impl Camera for FisheyeCamera {
    fn generate_initial_ray(&self, rng: &mut RngStream, _sample: u32, pixel_x: u32, pixel_y: u32) -> Ray {
        let s = self.data.sample(rng, pixel_x, pixel_y);

        let radius = 0.5 * min(self.data.width(), self.data.height());
        let u = (s.film_x - 0.5 * self.data.width()) / radius;
        let v = (0.5 * self.data.height() - s.film_y) / radius;
        let r = (u * u + v * v).sqrt();
        if r > 1.0 {
            return Ray::degenerate();
        }

        let theta = 0.5 * r * self.fov;
        let phi = v.atan2(u);
        let dir = Vector3f::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
        self.data.world_ray(dir, s.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_fall_outside_the_image_circle() {
        let data = CameraData::new((32, 32), 0.0, 0.0, Frame::default());
        let camera = FisheyeCamera::new(data, 180.0).unwrap();

        let mut rng = RngStream::new(1, 0, 0, 0);
        assert!(camera.generate_initial_ray(&mut rng, 0, 0, 0).is_degenerate());

        let mut rng = RngStream::new(1, 0, 16, 16);
        let ray = camera.generate_initial_ray(&mut rng, 0, 16, 16);
        assert!(!ray.is_degenerate());
        assert!(ray.d.z > 0.9);
    }

    #[test]
    fn invalid_fov_is_rejected() {
        let data = CameraData::new((4, 4), 0.0, 0.0, Frame::default());
        assert!(FisheyeCamera::new(data, -10.0).is_err());
        assert!(FisheyeCamera::new(data, 400.0).is_err());
    }
}
