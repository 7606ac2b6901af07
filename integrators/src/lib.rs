//! Integrators

#[macro_use]
extern crate log;

mod ground_plane;
mod sampling;
mod sky;

// Re-export.
pub use ground_plane::*;
pub use sampling::*;
pub use sky::*;
