//! Sampling

use wavefront_core::math::*;

/// π/2
const PI_OVER_TWO: Float = PI / 2.0;

/// π/4
const PI_OVER_FOUR: Float = PI / 4.0;

/// Uniformly sample a point on the unit disk using Shirley's concentric mapping.
///
/// * `u` - The random sample point.
pub fn concentric_sample_disk(u: (Float, Float)) -> (Float, Float) {
    // Map uniform random numbers to [-1,1]^2.
    let ox = 2.0 * u.0 - 1.0;
    let oy = 2.0 * u.1 - 1.0;

    // Handle degeneracy at the origin.
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }

    // Apply concentric mapping to point
    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, PI_OVER_FOUR * (oy / ox))
    } else {
        (oy, PI_OVER_TWO - PI_OVER_FOUR * (ox / oy))
    };

    (r * theta.cos(), r * theta.sin())
}

/// Sample a direction about the `(0, 0, 1)` axis with a cosine-weighted distribution.
///
/// * `u` - The random sample point.
pub fn cosine_sample_hemisphere(u: (Float, Float)) -> Vector3f {
    let (x, y) = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - x * x - y * y).sqrt();
    Vector3f::new(x, y, z)
}

/// Build two unit vectors orthogonal to `v` and each other.
///
/// * `v` - A unit vector.
pub fn coordinate_system(v: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v.x.abs() > v.y.abs() {
        Vector3f::new(-v.z, 0.0, v.x) * (1.0 / (v.x * v.x + v.z * v.z).sqrt())
    } else {
        Vector3f::new(0.0, v.z, -v.y) * (1.0 / (v.y * v.y + v.z * v.z).sqrt())
    };
    (v2, v.cross(&v2))
}
