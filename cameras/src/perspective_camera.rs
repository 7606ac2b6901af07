//! Perspective Camera

use crate::camera_data::*;
use wavefront_core::camera::*;
use wavefront_core::geometry::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;

/// Perspective camera.
pub struct PerspectiveCamera {
    /// Common camera parameters.
    pub data: CameraData,

    /// Half extent of the image plane at z=1 along the shorter image axis.
    pub tan_half_fov: Float,
}

impl PerspectiveCamera {
    /// Create a new perspective camera.
    ///
    /// * `data` - Common camera parameters.
    /// * `fov`  - The field-of-view angle in degrees along the shorter image axis.
    pub fn new(data: CameraData, fov: Float) -> Result<Self, String> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(format!("Perspective field of view {fov} must be in (0, 180) degrees"));
        }
        Ok(Self {
            data,
            tan_half_fov: (0.5 * fov.to_radians()).tan(),
        })
    }
}

impl Camera for PerspectiveCamera {
    fn generate_initial_ray(&self, rng: &mut RngStream, _sample: u32, pixel_x: u32, pixel_y: u32) -> Ray {
        let s = self.data.sample(rng, pixel_x, pixel_y);

        // Map the film to the image plane at z=1 keeping pixels square.
        let scale = 2.0 * self.tan_half_fov / min(self.data.width(), self.data.height());
        let dir = Vector3f::new(
            (s.film_x - 0.5 * self.data.width()) * scale,
            (0.5 * self.data.height() - s.film_y) * scale,
            1.0,
        );
        self.data.world_ray(dir, s.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn rays_spread_over_the_field_of_view() {
        let camera = PerspectiveCamera::new(CameraData::new((64, 64), 0.0, 0.0, Frame::default()), 90.0).unwrap();

        let mut rng = RngStream::new(1, 0, 32, 32);
        let centre = camera.generate_initial_ray(&mut rng, 0, 32, 32);
        assert!(centre.d.z > 0.99);
        assert!(!centre.is_degenerate());

        // Corner pixel of a 90 degree camera is close to 45 degrees off axis in x and y.
        let mut rng = RngStream::new(1, 0, 0, 0);
        let corner = camera.generate_initial_ray(&mut rng, 0, 0, 0);
        assert!(corner.d.x < 0.0 && corner.d.y > 0.0);
        assert!(approx_eq!(f32, corner.d.x / corner.d.z, -1.0, epsilon = 0.05));
    }

    #[test]
    fn invalid_fov_is_rejected() {
        let data = CameraData::new((4, 4), 0.0, 0.0, Frame::default());
        assert!(PerspectiveCamera::new(data, 0.0).is_err());
        assert!(PerspectiveCamera::new(data, 180.0).is_err());
    }
}
