//! Rays

use crate::math::*;
use std::fmt;

/// Auxilliary rays offset by one pixel in x and y direction.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RayDifferential {
    /// Origin of ray offset in x-direction.
    pub rx_origin: Point3f,

    /// Origin of ray offset in y-direction.
    pub ry_origin: Point3f,

    /// Direction of ray offset in x-direction.
    pub rx_direction: Vector3f,

    /// Direction of ray offset in y-direction.
    pub ry_direction: Vector3f,
}

impl RayDifferential {
    /// Create a new `RayDifferential`.
    ///
    /// * `rx_origin`    - Origin of ray offset in x-direction.
    /// * `ry_origin`    - Origin of ray offset in y-direction.
    /// * `rx_direction` - Direction of ray offset in x-direction.
    /// * `ry_direction` - Direction of ray offset in y-direction.
    pub fn new(rx_origin: Point3f, ry_origin: Point3f, rx_direction: Vector3f, ry_direction: Vector3f) -> Self {
        Self {
            rx_origin,
            ry_origin,
            rx_direction,
            ry_direction,
        }
    }
}

/// A Ray
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,

    /// Maximum extent of the ray. Zero marks a ray that should not be traced.
    pub t_max: Float,

    /// Time value.
    pub time: Float,

    /// Auxilliary rays offset by one sample in x and y direction.
    pub differentials: Option<RayDifferential>,
}

impl Ray {
    /// Returns a ray with no differentials.
    ///
    /// * `o`     - Origin.
    /// * `d`     - Direction.
    /// * `t_max` - Maximum extent of the ray.
    /// * `time`  - Time value.
    pub fn new(o: Point3f, d: Vector3f, t_max: Float, time: Float) -> Self {
        Self {
            o,
            d,
            t_max,
            time,
            differentials: None,
        }
    }

    /// Returns a zero extent ray used by cameras to signal that a sample does not map to the image.
    pub fn degenerate() -> Self {
        Self::default()
    }

    /// Returns `true` if the ray has zero extent.
    pub fn is_degenerate(&self) -> bool {
        self.t_max == 0.0
    }

    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool {
        self.o.has_nans() || self.d.has_nans() || self.t_max.is_nan()
    }

    /// Get position along the ray at given parameter.
    ///
    /// * `t` - Parameter to evaluate.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[o={}, d={}, t_max={}, time={}]", self.o, self.d, self.t_max, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn degenerate_ray_has_zero_extent() {
        assert!(Ray::degenerate().is_degenerate());
        let r = Ray::new(Point3f::ZERO, Vector3f::new(0.0, 0.0, 1.0), INFINITY, 0.0);
        assert!(!r.is_degenerate());
    }

    #[test]
    fn has_nans() {
        let point = Point3f::ZERO;
        let vector = Vector3f::new(1.0, 0.0, 0.0);
        assert!(Ray::new(Point3f::new(f32::NAN, 0.0, 0.0), vector, 1.0, 0.0).has_nans());
        assert!(Ray::new(point, vector, f32::NAN, 0.0).has_nans());
        assert!(!Ray::new(point, vector, 1.0, 0.0).has_nans());
    }

    proptest! {
        #[test]
        fn at_f32(
            ox in -100.0..100.0f32,
            dz in -100.0..100.0f32,
            t in -100.0..100.0f32,
        ) {
            let o = Point3f::new(ox, 0.0, 0.0);
            let d = Vector3f::new(0.0, 0.0, dz);
            let r = Ray::new(o, d, INFINITY, 0.0);
            prop_assert_eq!(r.at(t), o + d * t);
        }
    }
}
