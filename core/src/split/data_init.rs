//! Data init

use super::regenerate::regenerate;
use super::*;
use crate::queue::QueueId;

/// Dense stage run once per tile: every slot claims its first unit and starts a path. Regenerated slots are enqueued
/// into the active queue.
pub struct DataInit;

impl SplitKernel for DataInit {
    fn name(&self) -> &'static str {
        "data_init"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        let mut enqueue = vec![None; wg.local_size()];

        for lane in wg.lanes() {
            let Some(ray_index) = wg.dense_ray_index(lane) else {
                wg.exit(lane);
                continue;
            };

            let mut slot = ctx.store.lease(ray_index);
            let unit = ctx.allocator.first_work(ray_index);
            if regenerate(ctx, &mut slot, unit) {
                enqueue[lane] = Some(ray_index);
            }
        }

        wg.enqueue_ray_index_local(ctx.queues, QueueId::ActiveAndRegenerated, &enqueue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KernelData, LaunchConfig};
    use crate::state::RayState;
    use crate::testing::{Harness, PixelCamera};
    use std::collections::HashSet;

    #[test]
    fn every_slot_starts_a_path() {
        let config = LaunchConfig::for_tile(0, 0, 3, 2, 3, 2, 0, 4);
        let h = Harness::new(config, KernelData::default());

        h.run(&DataInit, false);

        assert_eq!(h.store.count(RayState::Regenerated), 12);
        let mut active = h.queues.entries(QueueId::ActiveAndRegenerated);
        active.sort_unstable();
        assert_eq!(active, (0..12).collect::<Vec<u32>>());

        let units: HashSet<_> = (0..12).map(|i| *h.store.lease(i).work).collect();
        assert_eq!(units.len(), 12);
    }

    #[test]
    fn degenerate_camera_ray_is_written_and_retried() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 2);
        let mut h = Harness::new(config, KernelData::default());
        h.camera = PixelCamera {
            degenerate: |sample, x, y| sample == 0 && x == 0 && y == 0,
        };

        h.run(&DataInit, false);

        assert_eq!(h.store.count(RayState::Regenerated), 4);
        assert_eq!(h.buffers.output.sample_count(0, 0), Some(1.0));
        assert_eq!(h.buffers.output.combined(0, 0), [0.0; 4]);
        assert_eq!(h.buffers.rng_state.max_dimension(0, 0), 2);
        for i in 0..4 {
            let slot = h.store.lease(i);
            assert!(!(slot.work.sample == 0 && slot.work.pixel_x == 0 && slot.work.pixel_y == 0));
        }
    }

    #[test]
    fn all_degenerate_samples_retire_every_slot() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 3);
        let mut h = Harness::new(config, KernelData::default());
        h.camera = PixelCamera {
            degenerate: |_, _, _| true,
        };

        h.run(&DataInit, false);

        assert!(h.store.all_inactive());
        assert!(h.queues.is_empty(QueueId::ActiveAndRegenerated));
        assert!(h.allocator.is_exhausted());
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(h.buffers.output.sample_count(x, y), Some(3.0));
        }
    }

    #[test]
    fn slots_past_the_work_stay_inactive() {
        // 4 slots per pixel but only 2 samples.
        let config = LaunchConfig::for_tile(0, 0, 1, 1, 1, 4, 0, 2);
        let h = Harness::new(config, KernelData::default());

        h.run(&DataInit, false);

        assert_eq!(h.store.count(RayState::Regenerated), 2);
        assert_eq!(h.store.count(RayState::Inactive), 2);
        assert_eq!(h.queues.len(QueueId::ActiveAndRegenerated), 2);
    }
}
