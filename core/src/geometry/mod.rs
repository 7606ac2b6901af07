//! Geometry

mod intersection;
mod ray;

// Re-export.
pub use crate::math::{Point3f, Vector3f};
pub use intersection::*;
pub use ray::*;
