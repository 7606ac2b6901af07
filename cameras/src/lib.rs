//! Camera

#[macro_use]
extern crate log;

mod camera_data;
mod environment_camera;
mod fisheye_camera;
mod perspective_camera;

// Re-export
pub use camera_data::*;
pub use environment_camera::*;
pub use fisheye_camera::*;
pub use perspective_camera::*;
