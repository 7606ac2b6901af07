//! Path State

use crate::math::*;
use bitflags::bitflags;

bitflags! {
    /// Describes how the current ray of a path was created.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PathRayFlags: u32 {
        const CAMERA = 1;
        const REFLECT = 2;
        const TRANSMIT = 4;
        const DIFFUSE = 8;
        const GLOSSY = 16;
        const SINGULAR = 32;
    }
}

/// Per path bookkeeping used by the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathState {
    /// Flags of the current ray.
    pub flag: PathRayFlags,

    /// Number of bounces so far.
    pub bounce: u32,

    /// Distance travelled since the last bounce. Lamp emission uses it to rebuild the continuation ray.
    pub ray_t: Float,

    /// Sample number being traced.
    pub sample: u32,
}

impl Default for PathState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PathState {
    /// Returns the state of a fresh camera path.
    ///
    /// * `sample` - Sample number.
    pub fn new(sample: u32) -> Self {
        Self {
            flag: PathRayFlags::CAMERA,
            bounce: 0,
            ray_t: 0.0,
            sample,
        }
    }

    /// Returns true if the current ray left the camera.
    pub fn is_camera_ray(&self) -> bool {
        self.flag.contains(PathRayFlags::CAMERA)
    }

    /// Advance the path to the next bounce.
    ///
    /// * `flag` - Flags describing the scattering event.
    pub fn next_bounce(&mut self, flag: PathRayFlags) {
        self.flag = flag - PathRayFlags::CAMERA;
        self.bounce += 1;
        self.ray_t = 0.0;
    }
}

/// Per slot diagnostics written to the debug pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugData {
    pub num_bounces: u32,
    pub num_emitter_hits: u32,
    pub num_intersections: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_bounce_clears_camera_flag() {
        let mut state = PathState::new(3);
        state.ray_t = 2.5;
        assert!(state.is_camera_ray());

        state.next_bounce(PathRayFlags::CAMERA | PathRayFlags::REFLECT | PathRayFlags::DIFFUSE);
        assert!(!state.is_camera_ray());
        assert_eq!(state.flag, PathRayFlags::REFLECT | PathRayFlags::DIFFUSE);
        assert_eq!(state.bounce, 1);
        assert_eq!(state.ray_t, 0.0);
        assert_eq!(state.sample, 3);
    }
}
