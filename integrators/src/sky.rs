//! Sky

use wavefront_core::geometry::*;
use wavefront_core::integrator::*;
use wavefront_core::math::*;
use wavefront_core::rng::RngStream;
use wavefront_core::spectrum::*;
use wavefront_core::state::PathState;

/// Vertical gradient between the horizon and the zenith. Directions below the horizon see the horizon colour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sky {
    /// Radiance at the horizon.
    pub horizon: Spectrum,

    /// Radiance straight up.
    pub zenith: Spectrum,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            horizon: Spectrum::from_rgb(1.0, 1.0, 1.0),
            zenith: Spectrum::from_rgb(0.5, 0.7, 1.0),
        }
    }
}

impl Sky {
    /// Returns the radiance seen along a direction.
    ///
    /// * `d` - Direction; need not be normalized.
    pub fn radiance(&self, d: &Vector3f) -> Spectrum {
        let len = d.length();
        if len == 0.0 {
            return self.horizon;
        }
        let t = clamp(d.y / len, 0.0, 1.0);
        lerp(t, self.horizon, self.zenith)
    }
}

/// Nothing but sky.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SkyIntegrator {
    pub sky: Sky,
}

impl SkyIntegrator {
    /// Create a new `SkyIntegrator`.
    ///
    /// * `sky` - The sky.
    pub fn new(sky: Sky) -> Self {
        Self { sky }
    }
}

impl Integrator for SkyIntegrator {
    fn sample_emitter_along_ray(&self, _state: &PathState, _ray: &Ray) -> Option<Spectrum> {
        None
    }

    fn sample_background(&self, _state: &PathState, ray: &Ray) -> Spectrum {
        self.sky.radiance(&ray.d)
    }

    fn intersect(&self, _state: &PathState, _ray: &Ray) -> Option<Intersection> {
        None
    }

    fn shade_surface(&self, _state: &PathState, _ray: &Ray, _isect: &Intersection, _rng: &mut RngStream) -> SurfaceShade {
        SurfaceShade::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_runs_from_horizon_to_zenith() {
        let sky = Sky::default();
        assert_eq!(sky.radiance(&Vector3f::new(1.0, 0.0, 0.0)), sky.horizon);
        assert_eq!(sky.radiance(&Vector3f::new(0.0, 2.0, 0.0)), sky.zenith);
        assert_eq!(sky.radiance(&Vector3f::new(0.0, -1.0, 0.0)), sky.horizon);
        assert_eq!(sky.radiance(&Vector3f::ZERO), sky.horizon);
    }

    #[test]
    fn sky_integrator_never_hits() {
        let integrator = SkyIntegrator::default();
        let ray = Ray::new(Point3f::ZERO, Vector3f::new(0.0, 1.0, 0.0), INFINITY, 0.0);
        let state = PathState::new(0);
        assert!(integrator.intersect(&state, &ray).is_none());
        assert_eq!(integrator.sample_background(&state, &ray), integrator.sky.zenith);
    }
}
