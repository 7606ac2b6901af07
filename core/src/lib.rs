//! Core of the wavefront (split kernel) path tracing scheduler.

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod buffer;
pub mod camera;
pub mod config;
pub mod device;
pub mod geometry;
pub mod integrator;
pub mod math;
pub mod parallel;
pub mod queue;
pub mod rng;
pub mod scheduler;
pub mod spectrum;
pub mod split;
pub mod state;
pub mod stats;
pub mod work;

#[cfg(test)]
pub(crate) mod testing;
