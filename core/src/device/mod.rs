//! Device

mod workgroup;

// Re-export
pub use workgroup::*;

use crate::math::div_ceil;
use crate::split::{KernelContext, SplitKernel};
use crate::{report_stats, stat_counter, stat_inc, stat_percent, stat_register_fns};
use std::any::Any;
use std::fmt;
use std::str::FromStr;

stat_counter!("Device/Kernel dispatches", DISPATCHES, device_stats_dispatches);
stat_percent!("Device/Idle lanes", IDLE_LANES, TOTAL_LANES, device_stats_idle_lanes);
stat_register_fns!(device_stats_dispatches, device_stats_idle_lanes);

/// What a lane does when it has no slot to process.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum EarlyExit {
    /// The lane leaves the workgroup and takes no part in later phases.
    Return,

    /// The lane stays and joins later phases with nothing to enqueue.
    #[default]
    GuardedSkip,
}

impl FromStr for EarlyExit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "return" => Ok(Self::Return),
            "skip" | "guarded-skip" => Ok(Self::GuardedSkip),
            _ => Err(format!("Unknown early exit policy '{s}'")),
        }
    }
}

impl fmt::Display for EarlyExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Return => f.write_str("return"),
            Self::GuardedSkip => f.write_str("skip"),
        }
    }
}

/// Executes split kernels with the lock-step workgroup model on CPU threads.
///
/// A dispatch covers `global_size` lanes rounded up to whole workgroups. Workgroups are fed to worker threads over a
/// channel; the lanes of a workgroup run on one thread and barriers are the boundaries between the phases of a
/// kernel. Returning from `enqueue_kernel` is the global barrier.
#[derive(Clone, Debug)]
pub struct Device {
    /// Number of worker threads.
    threads: usize,

    /// Lanes per workgroup.
    local_size: usize,

    /// Early exit policy.
    early_exit: EarlyExit,
}

impl Device {
    /// Create a device.
    ///
    /// * `threads`    - Number of worker threads.
    /// * `local_size` - Lanes per workgroup.
    /// * `early_exit` - Early exit policy.
    pub fn new(threads: usize, local_size: usize, early_exit: EarlyExit) -> Result<Self, String> {
        if threads == 0 {
            return Err(String::from("Device needs at least one thread"));
        }
        if local_size == 0 {
            return Err(String::from("Workgroup size must be at least 1"));
        }

        register_stats();

        Ok(Self {
            threads,
            local_size,
            early_exit,
        })
    }

    /// Returns the number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Returns the number of lanes per workgroup.
    pub fn local_size(&self) -> usize {
        self.local_size
    }

    /// Returns the early exit policy.
    pub fn early_exit(&self) -> EarlyExit {
        self.early_exit
    }

    /// Run a kernel over `global_size` lanes and wait for all workgroups to finish. Lanes dequeue slots when
    /// `ctx.config.use_queues` is set. A panic in a workgroup is re-raised on the calling thread.
    ///
    /// * `kernel`      - The kernel.
    /// * `ctx`         - Kernel context.
    /// * `global_size` - Number of lanes that map to slots.
    pub fn enqueue_kernel(&self, kernel: &dyn SplitKernel, ctx: &KernelContext, global_size: usize) {
        let use_queues = ctx.config.use_queues;
        let num_groups = div_ceil(global_size, self.local_size);
        let snapshot = ctx.queues.snapshot();

        debug!(
            "Dispatching {} over {} workgroups of {} lanes ({})",
            kernel.name(),
            num_groups,
            self.local_size,
            if use_queues { "compacted" } else { "dense" }
        );
        stat_inc!(DISPATCHES, 1);

        let run = |group_id: usize| {
            let mut wg = Workgroup::new(
                group_id,
                self.local_size,
                global_size,
                use_queues,
                self.early_exit,
                snapshot,
            );
            kernel.execute(ctx, &mut wg);
            stat_inc!(IDLE_LANES, wg.idle_lanes() as i64);
            stat_inc!(TOTAL_LANES, self.local_size as i64);
        };

        let n_threads = self.threads.min(num_groups);
        if n_threads <= 1 {
            (0..num_groups).for_each(run);
            return;
        }

        let result = crossbeam::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded(n_threads);

            // Spawn worker threads.
            for _ in 0..n_threads {
                let rxc = rx.clone();
                let run = &run;
                scope.spawn(move |_| {
                    for group_id in rxc.iter() {
                        run(group_id);
                    }
                    report_stats!();
                });
            }
            drop(rx); // Drop extra rx since we've cloned one for each worker.

            // Send work.
            for group_id in 0..num_groups {
                if tx.send(group_id).is_err() {
                    break; // Every worker is gone; the panic is picked up below.
                }
            }
        });

        if let Err(err) = result {
            resume_worker_panic(err);
        }
    }
}

/// Re-raise the first panic of a worker thread so assertion messages reach the caller.
fn resume_worker_panic(err: Box<dyn Any + Send + 'static>) -> ! {
    match err.downcast::<Vec<Box<dyn Any + Send + 'static>>>() {
        Ok(mut panics) if !panics.is_empty() => std::panic::resume_unwind(panics.swap_remove(0)),
        Ok(_) => panic!("Worker thread panicked"),
        Err(err) => std::panic::resume_unwind(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_sizes() {
        assert!(Device::new(0, 8, EarlyExit::Return).is_err());
        assert!(Device::new(2, 0, EarlyExit::Return).is_err());
        let device = Device::new(2, 8, EarlyExit::Return).unwrap();
        assert_eq!((device.threads(), device.local_size()), (2, 8));
        assert_eq!(device.early_exit(), EarlyExit::Return);
    }

    #[test]
    fn early_exit_from_str() {
        assert_eq!("return".parse::<EarlyExit>(), Ok(EarlyExit::Return));
        assert_eq!("skip".parse::<EarlyExit>(), Ok(EarlyExit::GuardedSkip));
        assert!("wait".parse::<EarlyExit>().is_err());
        assert_eq!(EarlyExit::default().to_string(), "skip");
    }
}
