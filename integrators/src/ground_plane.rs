//! Ground Plane Integrator

use crate::sampling::*;
use crate::sky::*;
use wavefront_core::geometry::*;
use wavefront_core::integrator::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;
use wavefront_core::spectrum::*;
use wavefront_core::state::{PathRayFlags, PathState};

/// Offset used to move continuation rays off the surface they left.
const RAY_EPSILON: Float = 1e-4;

/// Spherical lamp. It is not part of the intersectable scene; continuation rays find it through lamp emission.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereLamp {
    /// Centre.
    pub center: Point3f,

    /// Radius.
    pub radius: Float,

    /// Emitted radiance.
    pub emission: Spectrum,
}

impl SphereLamp {
    /// Returns the closest ray parameter in `(RAY_EPSILON, ray.t_max)` where the ray enters or leaves the sphere.
    ///
    /// * `ray` - The ray.
    pub fn intersect(&self, ray: &Ray) -> Option<Float> {
        let a = ray.d.length_squared();
        if a == 0.0 {
            return None;
        }

        let oc = ray.o - self.center;
        let half_b = oc.dot(&ray.d);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        [(-half_b - root) / a, (-half_b + root) / a]
            .into_iter()
            .find(|&t| t > RAY_EPSILON && t < ray.t_max)
    }
}

/// Diffuse checkered ground under a sky, optionally lit by a spherical lamp.
///
/// There is no light sampling, so emission found by continuation rays carries the full weight and scenes only see
/// the lamp when lamp emission is enabled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GroundPlaneIntegrator {
    /// The sky.
    pub sky: Sky,

    /// Height of the ground plane.
    pub height: Float,

    /// Albedo of the two checker squares.
    pub albedo: (Spectrum, Spectrum),

    /// Size of a checker square.
    pub checker_size: Float,

    /// Optional lamp.
    pub lamp: Option<SphereLamp>,

    /// Bounce from which Russian roulette terminates paths.
    pub rr_depth: u32,
}

impl Default for GroundPlaneIntegrator {
    fn default() -> Self {
        Self {
            sky: Sky::default(),
            height: 0.0,
            albedo: (Spectrum::new(0.8), Spectrum::new(0.3)),
            checker_size: 1.0,
            lamp: Some(SphereLamp {
                center: Point3f::new(0.0, 2.0, 0.0),
                radius: 0.5,
                emission: Spectrum::new(4.0),
            }),
            rr_depth: 3,
        }
    }
}

impl GroundPlaneIntegrator {
    /// Create a new `GroundPlaneIntegrator`.
    ///
    /// * `sky`          - The sky.
    /// * `height`       - Height of the ground plane.
    /// * `albedo`       - Albedo of the two checker squares.
    /// * `checker_size` - Size of a checker square.
    /// * `lamp`         - Optional lamp.
    pub fn new(
        sky: Sky,
        height: Float,
        albedo: (Spectrum, Spectrum),
        mut checker_size: Float,
        lamp: Option<SphereLamp>,
    ) -> Self {
        if checker_size.is_nan() || checker_size <= 0.0 {
            warn!("Checker size {checker_size} must be positive. Using 1.");
            checker_size = 1.0;
        }
        Self {
            sky,
            height,
            albedo,
            checker_size,
            lamp,
            ..Self::default()
        }
    }

    /// Returns the albedo of the ground at a point.
    ///
    /// * `p` - Point on the ground.
    pub fn albedo_at(&self, p: &Point3f) -> Spectrum {
        let i = (p.x / self.checker_size).floor() as i64 + (p.z / self.checker_size).floor() as i64;
        if i.rem_euclid(2) == 0 {
            self.albedo.0
        } else {
            self.albedo.1
        }
    }
}

impl Integrator for GroundPlaneIntegrator {
    fn sample_emitter_along_ray(&self, _state: &PathState, ray: &Ray) -> Option<Spectrum> {
        self.lamp
            .as_ref()
            .and_then(|lamp| lamp.intersect(ray).map(|_| lamp.emission))
    }

    fn sample_background(&self, _state: &PathState, ray: &Ray) -> Spectrum {
        self.sky.radiance(&ray.d)
    }

    fn intersect(&self, _state: &PathState, ray: &Ray) -> Option<Intersection> {
        // One sided; only rays coming down from above hit.
        if ray.d.y >= 0.0 || ray.o.y <= self.height {
            return None;
        }

        let t = (self.height - ray.o.y) / ray.d.y;
        (t > RAY_EPSILON && t < ray.t_max).then(|| Intersection::new(t, ray.at(t), Vector3f::new(0.0, 1.0, 0.0), 0))
    }

    fn shade_surface(&self, state: &PathState, ray: &Ray, isect: &Intersection, rng: &mut RngStream) -> SurfaceShade {
        let albedo = self.albedo_at(&isect.p);

        let local = cosine_sample_hemisphere(rng.get_2d());
        let (s, t) = coordinate_system(&isect.n);
        let wi = s * local.x + t * local.y + isect.n * local.z;

        // Cosine sampling cancels the cosine and 1/π of the diffuse BSDF.
        let mut weight = albedo;
        if state.bounce >= self.rr_depth {
            let q = max(0.05, 1.0 - max(albedo[0], max(albedo[1], albedo[2])));
            if rng.get_1d() < q {
                return SurfaceShade::default();
            }
            weight = weight / (1.0 - q);
        }

        SurfaceShade {
            emission: Spectrum::ZERO,
            scatter: Some(Scatter {
                weight,
                ray: Ray::new(isect.p + isect.n * RAY_EPSILON, wi, INFINITY, ray.time),
                flags: PathRayFlags::REFLECT | PathRayFlags::DIFFUSE,
            }),
        }
    }
}
