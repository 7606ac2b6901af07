//! Split kernel stages

mod background_buffer_update;
mod data_init;
mod lamp_emission;
mod queue_enqueue;
mod regenerate;
mod scene_intersect;
mod shade_surface;

// Re-export
pub use background_buffer_update::*;
pub use data_init::*;
pub use lamp_emission::*;
pub use queue_enqueue::*;
pub use scene_intersect::*;
pub use shade_surface::*;

use crate::buffer::RenderBuffers;
use crate::camera::Camera;
use crate::config::{KernelData, LaunchConfig};
use crate::device::Workgroup;
use crate::integrator::Integrator;
use crate::queue::QueueManager;
use crate::state::RayStateStore;
use crate::work::WorkAllocator;
use crate::{stat_counter, stat_register_fns};

stat_counter!("Paths/Paths regenerated", PATHS_REGENERATED, split_stats_regenerated);
stat_counter!("Paths/Degenerate camera samples", DEGENERATE_SAMPLES, split_stats_degenerate);
stat_counter!("Paths/Samples written", SAMPLES_WRITTEN, split_stats_written);
stat_counter!("Paths/Emitter hits along continuation rays", LAMP_EMISSION_HITS, split_stats_lamp_hits);
stat_register_fns!(
    split_stats_regenerated,
    split_stats_degenerate,
    split_stats_written,
    split_stats_lamp_hits,
);

/// Everything a stage reads or writes. Passed explicitly to every dispatch.
#[derive(Clone, Copy)]
pub struct KernelContext<'a> {
    /// Launch configuration of the tile.
    pub config: &'a LaunchConfig,

    /// Scene constants.
    pub kernel_data: &'a KernelData,

    /// Slot storage.
    pub store: &'a RayStateStore,

    /// Queues.
    pub queues: &'a QueueManager,

    /// Work allocator of the tile.
    pub allocator: &'a dyn WorkAllocator,

    /// Output buffers.
    pub buffers: &'a RenderBuffers,

    /// Light transport.
    pub integrator: &'a dyn Integrator,

    /// Primary ray generation.
    pub camera: &'a dyn Camera,
}

/// One stage of the pipeline. `execute` runs a whole workgroup and must take every lane through the same phases.
pub trait SplitKernel: Send + Sync {
    /// Returns the stage name for logging.
    fn name(&self) -> &'static str;

    /// Run the stage for one workgroup.
    ///
    /// * `ctx` - Kernel context.
    /// * `wg`  - The workgroup.
    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup);
}
