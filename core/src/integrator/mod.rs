//! Integrator

use crate::geometry::*;
use crate::rng::RngStream;
use crate::spectrum::*;
use crate::state::{PathRayFlags, PathState};

/// Continuation of a path after a surface interaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scatter {
    /// Factor applied to the path throughput.
    pub weight: Spectrum,

    /// The continuation ray.
    pub ray: Ray,

    /// Flags describing the scattering event.
    pub flags: PathRayFlags,
}

/// Result of shading a surface hit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceShade {
    /// Radiance emitted by the surface towards the ray origin.
    pub emission: Spectrum,

    /// The continuation, or `None` if the path ends here.
    pub scatter: Option<Scatter>,
}

/// Light transport evaluated on behalf of the stages. Implementations are pure functions of their arguments and never
/// see slot storage.
pub trait Integrator: Send + Sync {
    /// Returns emission of an emitter hit by a continuation ray, weighted for multiple importance sampling.
    ///
    /// * `state` - Path state.
    /// * `ray`   - Continuation ray from the last bounce.
    fn sample_emitter_along_ray(&self, state: &PathState, ray: &Ray) -> Option<Spectrum>;

    /// Returns the background radiance seen along a ray that left the scene.
    ///
    /// * `state` - Path state.
    /// * `ray`   - The ray.
    fn sample_background(&self, state: &PathState, ray: &Ray) -> Spectrum;

    /// Returns the closest hit along a ray within `ray.t_max`.
    ///
    /// * `state` - Path state.
    /// * `ray`   - The ray.
    fn intersect(&self, state: &PathState, ray: &Ray) -> Option<Intersection>;

    /// Shade a surface hit.
    ///
    /// * `state` - Path state.
    /// * `ray`   - The ray that found the hit.
    /// * `isect` - The hit.
    /// * `rng`   - Random stream of the sample.
    fn shade_surface(
        &self,
        state: &PathState,
        ray: &Ray,
        isect: &Intersection,
        rng: &mut RngStream,
    ) -> SurfaceShade;
}
