//! Common camera parameters

use std::mem::swap;
use wavefront_core::geometry::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;

/// Orthonormal camera frame. Cameras look down `forward`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frame {
    /// Camera position.
    pub origin: Point3f,

    /// Image x-axis.
    pub right: Vector3f,

    /// Image y-axis.
    pub up: Vector3f,

    /// Viewing direction.
    pub forward: Vector3f,
}

impl Frame {
    /// Create a frame at `from` looking towards `to`.
    ///
    /// * `from` - Camera position.
    /// * `to`   - Point the camera looks at.
    /// * `up`   - Approximate up direction.
    pub fn look_at(from: Point3f, to: Point3f, up: Vector3f) -> Result<Self, String> {
        let dir = to - from;
        if dir.length_squared() == 0.0 {
            return Err(format!("Camera position {from} and target coincide"));
        }
        let forward = dir.normalize();

        let right = up.normalize().cross(&forward);
        if right.length_squared() == 0.0 {
            return Err(format!("Up vector {up} and viewing direction {forward} are parallel"));
        }
        let right = right.normalize();
        let up = forward.cross(&right);

        Ok(Self {
            origin: from,
            right,
            up,
            forward,
        })
    }

    /// Transform a camera space direction to world space.
    ///
    /// * `v` - Direction with x along `right`, y along `up` and z along `forward`.
    pub fn to_world(&self, v: Vector3f) -> Vector3f {
        self.right * v.x + self.up * v.y + self.forward * v.z
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            origin: Point3f::ZERO,
            right: Vector3f::new(1.0, 0.0, 0.0),
            up: Vector3f::new(0.0, 1.0, 0.0),
            forward: Vector3f::new(0.0, 0.0, 1.0),
        }
    }
}

/// Film position and time of a camera sample.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraSample {
    /// Film x-coordinate in pixels.
    pub film_x: Float,

    /// Film y-coordinate in pixels.
    pub film_y: Float,

    /// Time.
    pub time: Float,
}

/// Parameters shared by all cameras.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraData {
    /// Image resolution in pixels.
    pub resolution: (u32, u32),

    /// Time when shutter is open.
    pub shutter_open: Float,

    /// Time when shutter is closed.
    pub shutter_close: Float,

    /// Camera to world frame.
    pub frame: Frame,
}

impl CameraData {
    /// Create new camera parameters.
    ///
    /// * `resolution`    - Image resolution in pixels.
    /// * `shutter_open`  - Time when shutter is open.
    /// * `shutter_close` - Time when shutter is closed.
    /// * `frame`         - Camera to world frame.
    pub fn new(resolution: (u32, u32), mut shutter_open: Float, mut shutter_close: Float, frame: Frame) -> Self {
        if shutter_close < shutter_open {
            warn!(
                "Shutter close time [{}] < shutter open [{}]. Swapping them.",
                shutter_close, shutter_open
            );
            swap(&mut shutter_close, &mut shutter_open);
        }

        Self {
            resolution,
            shutter_open,
            shutter_close,
            frame,
        }
    }

    /// Returns the image width as a `Float`.
    pub fn width(&self) -> Float {
        self.resolution.0 as Float
    }

    /// Returns the image height as a `Float`.
    pub fn height(&self) -> Float {
        self.resolution.1 as Float
    }

    /// Jitter a pixel and pick a time from the sample's random stream.
    ///
    /// * `rng`     - Random stream of the sample.
    /// * `pixel_x` - Pixel x-coordinate.
    /// * `pixel_y` - Pixel y-coordinate.
    pub fn sample(&self, rng: &mut RngStream, pixel_x: u32, pixel_y: u32) -> CameraSample {
        let (u, v) = rng.get_2d();
        let t = rng.get_1d();
        CameraSample {
            film_x: pixel_x as Float + u,
            film_y: pixel_y as Float + v,
            time: lerp(t, self.shutter_open, self.shutter_close),
        }
    }

    /// Returns a ray from the camera position along a camera space direction.
    ///
    /// * `dir`  - Camera space direction.
    /// * `time` - Time.
    pub fn world_ray(&self, dir: Vector3f, time: Float) -> Ray {
        Ray::new(self.frame.origin, self.frame.to_world(dir).normalize(), INFINITY, time)
    }
}
