//! Render buffers

mod output;
mod pass;
mod rng_state;

// Re-export
pub use output::*;
pub use pass::*;
pub use rng_state::*;

use crate::config::{LaunchConfig, PassFlags};

/// Host owned buffers a tile renders into.
pub struct RenderBuffers {
    /// Multi-pass output.
    pub output: OutputBuffer,

    /// Per pixel random number seeds.
    pub rng_state: RngStateBuffer,
}

impl RenderBuffers {
    /// Allocate buffers for an image.
    ///
    /// * `width`            - Image width.
    /// * `height`           - Image height.
    /// * `parallel_samples` - Sample slots per pixel.
    /// * `pass_flags`       - Optional passes to record.
    /// * `seed`             - Seed for the per pixel random number seeds.
    pub fn new(width: usize, height: usize, parallel_samples: usize, pass_flags: PassFlags, seed: u32) -> Self {
        Self {
            output: OutputBuffer::new(width, height, parallel_samples, PassLayout::new(pass_flags)),
            rng_state: RngStateBuffer::new(width, height, seed),
        }
    }

    /// Check that a tile fits the buffers.
    ///
    /// * `config` - Launch configuration of the tile.
    pub fn validate_for(&self, config: &LaunchConfig) -> Result<(), String> {
        self.output.validate_for(config)?;
        self.rng_state.validate_for(config)
    }
}
