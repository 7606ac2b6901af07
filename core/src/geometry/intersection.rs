//! Intersection

use crate::math::*;

/// Result of a scene intersection query filled in by the integrator.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Intersection {
    /// Ray parameter of the hit.
    pub t: Float,

    /// Hit point.
    pub p: Point3f,

    /// Geometric normal at the hit point.
    pub n: Vector3f,

    /// Identifier of the primitive that was hit.
    pub prim: u32,
}

impl Intersection {
    /// Create a new `Intersection`.
    ///
    /// * `t`    - Ray parameter of the hit.
    /// * `p`    - Hit point.
    /// * `n`    - Geometric normal.
    /// * `prim` - Primitive identifier.
    pub fn new(t: Float, p: Point3f, n: Vector3f, prim: u32) -> Self {
        Self { t, p, n, prim }
    }
}
