//! Split kernel scheduler

use crate::buffer::RenderBuffers;
use crate::camera::Camera;
use crate::config::{KernelData, LaunchConfig, PassFlags};
use crate::device::{Device, EarlyExit};
use crate::integrator::Integrator;
use crate::math::Float;
use crate::queue::{QueueId, QueueManager};
use crate::split::*;
use crate::state::{RayState, RayStateStore};
use crate::work::{create_work_allocator, AllocationPolicy};
use crate::{report_stats, stat_dist, stat_inc, stat_int_distribution, stat_percent, stat_register_fns};
use std::fmt;
use std::str::FromStr;

stat_int_distribution!("Scheduler/Passes per tile", PASSES_PER_TILE, scheduler_stats_passes);
stat_percent!(
    "Scheduler/Compacted passes",
    COMPACTED_PASSES,
    TOTAL_PASSES,
    scheduler_stats_compacted
);
stat_register_fns!(scheduler_stats_passes, scheduler_stats_compacted);

/// Decides per pass whether stages visit every slot or dequeue slots from queues.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum QueueMode {
    /// Always visit every slot.
    Dense,

    /// Always dequeue.
    Compacted,

    /// Dequeue once the active queue holds fewer than `threshold` of the slots.
    Adaptive { threshold: Float },
}

impl Default for QueueMode {
    fn default() -> Self {
        Self::Adaptive { threshold: 0.5 }
    }
}

impl QueueMode {
    /// Returns true if a pass should dequeue slots.
    ///
    /// * `active`    - Number of entries in the active queue.
    /// * `num_slots` - Number of slots.
    pub fn use_queues(&self, active: usize, num_slots: usize) -> bool {
        match *self {
            Self::Dense => false,
            Self::Compacted => true,
            Self::Adaptive { threshold } => (active as Float) < threshold * num_slots as Float,
        }
    }
}

impl FromStr for QueueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "dense" => Ok(Self::Dense),
            None if s == "compacted" => Ok(Self::Compacted),
            None if s == "adaptive" => Ok(Self::default()),
            Some(("adaptive", t)) => match t.parse::<Float>() {
                Ok(threshold) if (0.0..=1.0).contains(&threshold) => Ok(Self::Adaptive { threshold }),
                _ => Err(format!("Invalid adaptive threshold '{t}', expected a value in [0, 1]")),
            },
            _ => Err(format!("Unknown queue mode '{s}'")),
        }
    }
}

impl fmt::Display for QueueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Compacted => f.write_str("compacted"),
            Self::Adaptive { threshold } => write!(f, "adaptive:{threshold}"),
        }
    }
}

/// Scheduler settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SchedulerOptions {
    /// Worker threads of the device.
    pub threads: usize,

    /// Lanes per workgroup.
    pub local_size: usize,

    /// Partition width and height for work stealing.
    pub partition_size: (usize, usize),

    /// Work allocation policy.
    pub allocation: AllocationPolicy,

    /// Early exit policy of the device.
    pub early_exit: EarlyExit,

    /// Dense or compacted dispatch.
    pub queue_mode: QueueMode,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            local_size: 64,
            partition_size: (8, 8),
            allocation: AllocationPolicy::default(),
            early_exit: EarlyExit::default(),
            queue_mode: QueueMode::default(),
        }
    }
}

/// What happened while rendering a tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Pipeline passes run after data init.
    pub passes: usize,

    /// Passes that dequeued slots.
    pub compacted_passes: usize,

    /// Work units in the tile.
    pub total_work: u64,

    /// Slot storage and queues of the previous tile were reused.
    pub reused_storage: bool,
}

/// Slot storage and queues. Kept between tiles with the same slot count.
struct TileStorage {
    store: RayStateStore,
    queues: QueueManager,
}

impl TileStorage {
    /// Returns true if the storage fits a tile.
    ///
    /// * `config` - Launch configuration of the tile.
    /// * `debug`  - Debug records are needed.
    fn fits(&self, config: &LaunchConfig, debug: bool) -> bool {
        self.store.len() == config.num_slots()
            && self.store.has_debug() == debug
            && self.queues.capacity() == config.queue_capacity
    }
}

/// Drives the stages over a tile until every slot is `Inactive`.
pub struct SplitKernelDriver {
    /// Settings.
    options: SchedulerOptions,

    /// Scene constants.
    kernel_data: KernelData,

    /// Executes the stages.
    device: Device,

    /// Storage of the last tile.
    storage: Option<TileStorage>,
}

impl SplitKernelDriver {
    /// Create a driver.
    ///
    /// * `options`     - Scheduler settings.
    /// * `kernel_data` - Scene constants.
    pub fn new(options: SchedulerOptions, kernel_data: KernelData) -> Result<Self, String> {
        let device = Device::new(options.threads, options.local_size, options.early_exit)?;

        register_stats();
        crate::split::register_stats();

        Ok(Self {
            options,
            kernel_data,
            device,
            storage: None,
        })
    }

    /// Returns the settings.
    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Returns cleared storage for a tile, reusing the last tile's storage when it fits.
    ///
    /// * `config` - Launch configuration of the tile.
    /// * `debug`  - Allocate debug records.
    fn take_storage(&mut self, config: &LaunchConfig, debug: bool) -> (TileStorage, bool) {
        match self.storage.take() {
            Some(mut storage) if storage.fits(config, debug) => {
                storage.store.reset();
                storage.queues.clear();
                (storage, true)
            }
            _ => {
                let storage = TileStorage {
                    store: RayStateStore::new(config.num_slots(), debug),
                    queues: QueueManager::new(config.queue_capacity),
                };
                (storage, false)
            }
        }
    }

    /// Render a tile into `buffers`.
    ///
    /// `config.use_queues` is decided per pass by the queue mode; the value passed in is ignored. Slot storage and
    /// queues of the previous tile are cleared and reused when the slot count matches.
    ///
    /// * `config`     - Launch configuration of the tile.
    /// * `buffers`    - Output buffers.
    /// * `integrator` - Light transport.
    /// * `camera`     - Primary ray generation.
    pub fn path_trace(
        &mut self,
        config: &LaunchConfig,
        buffers: &RenderBuffers,
        integrator: &dyn Integrator,
        camera: &dyn Camera,
    ) -> Result<RenderSummary, String> {
        config.validate()?;
        buffers.validate_for(config)?;

        let pass_flags = self.kernel_data.film.pass_flags;
        if buffers.output.layout().flags != pass_flags {
            return Err(format!(
                "Output passes {:?} do not match film passes {:?}",
                buffers.output.layout().flags,
                pass_flags
            ));
        }

        let num_slots = config.num_slots();
        let allocator = create_work_allocator(config, self.options.allocation, self.options.partition_size)?;
        let (storage, reused_storage) = self.take_storage(config, pass_flags.contains(PassFlags::DEBUG));
        let TileStorage { store, queues } = &storage;

        info!(
            "Starting tile ({}, {}) {}x{}, samples [{}, {}), {} slots, {} work units",
            config.x,
            config.y,
            config.width,
            config.height,
            config.start_sample,
            config.end_sample,
            num_slots,
            allocator.total_work()
        );

        let init_config = config.with_use_queues(false);
        let init_ctx = KernelContext {
            config: &init_config,
            kernel_data: &self.kernel_data,
            store,
            queues,
            allocator: allocator.as_ref(),
            buffers,
            integrator,
            camera,
        };
        self.device.enqueue_kernel(&DataInit, &init_ctx, num_slots);

        let mut summary = RenderSummary {
            total_work: allocator.total_work(),
            reused_storage,
            ..RenderSummary::default()
        };
        while !store.all_inactive() {
            let active = queues.len(QueueId::ActiveAndRegenerated);
            let use_queues = self.options.queue_mode.use_queues(active, num_slots);
            let pass_config = config.with_use_queues(use_queues);
            let ctx = KernelContext {
                config: &pass_config,
                ..init_ctx
            };

            self.device.enqueue_kernel(&SceneIntersect, &ctx, num_slots);
            self.device.enqueue_kernel(&LampEmission, &ctx, num_slots);
            self.device.enqueue_kernel(&QueueEnqueue, &init_ctx, num_slots);
            self.device.enqueue_kernel(&BackgroundBufferUpdate, &ctx, num_slots);
            self.device.enqueue_kernel(&ShadeSurface, &ctx, num_slots);

            summary.passes += 1;
            if use_queues {
                summary.compacted_passes += 1;
                stat_inc!(COMPACTED_PASSES, 1);
            }
            stat_inc!(TOTAL_PASSES, 1);

            debug!(
                "Pass {} ({}): {} active, {} inactive of {} slots",
                summary.passes,
                if use_queues { "compacted" } else { "dense" },
                active,
                store.count(RayState::Inactive),
                num_slots
            );
        }
        debug_assert!(allocator.is_exhausted(), "Slots retired before the work ran out");

        stat_dist!(PASSES_PER_TILE, summary.passes as i64);
        report_stats!();

        info!(
            "Finished tile ({}, {}) in {} passes ({} compacted)",
            config.x, config.y, summary.passes, summary.compacted_passes
        );

        self.storage = Some(storage);
        Ok(summary)
    }
}
