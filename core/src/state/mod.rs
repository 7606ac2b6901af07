//! Ray state

mod path_state;
mod radiance;
mod ray_state;
mod store;

// Re-export
pub use path_state::*;
pub use radiance::*;
pub use ray_state::*;
pub use store::*;
