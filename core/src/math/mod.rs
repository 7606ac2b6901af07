//! Math common stuff

mod common;
mod vector3;

// Re-export
pub use common::*;
pub use vector3::*;
