//! Queue enqueue

use super::*;
use crate::queue::QueueId;
use crate::state::RayState;

/// Dense stage that rebuilds the queues from the slot states: `Active` slots go to the active queue, slots that hit
/// the background or finished their path go to the buffer update queue.
pub struct QueueEnqueue;

impl SplitKernel for QueueEnqueue {
    fn name(&self) -> &'static str {
        "queue_enqueue"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        let mut active = vec![None; wg.local_size()];
        let mut buffer_update = vec![None; wg.local_size()];

        for lane in wg.lanes() {
            let Some(ray_index) = wg.dense_ray_index(lane) else {
                wg.exit(lane);
                continue;
            };

            let state = ctx.store.state(ray_index);
            if state == RayState::Active {
                active[lane] = Some(ray_index);
            } else if state.needs_buffer_update() {
                buffer_update[lane] = Some(ray_index);
            }
        }

        wg.enqueue_ray_index_local(ctx.queues, QueueId::ActiveAndRegenerated, &active);
        wg.enqueue_ray_index_local(ctx.queues, QueueId::HitBackgroundUpdateBufferToRegenerate, &buffer_update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KernelData, LaunchConfig};
    use crate::device::{Device, EarlyExit};
    use crate::testing::Harness;

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    fn check_partition(early_exit: EarlyExit) {
        // 10 slots over workgroups of 4 leaves two lanes without a slot.
        let config = LaunchConfig::for_tile(0, 0, 5, 2, 5, 1, 0, 1);
        let mut h = Harness::new(config, KernelData::default());
        h.device = Device::new(2, 4, early_exit).unwrap();
        for (i, state) in RayState::ALL.iter().cycle().take(10).enumerate() {
            h.store.set_state(i, *state);
        }

        h.run(&QueueEnqueue, false);

        let states = h.store.states();
        let expect = |f: fn(&RayState) -> bool| {
            states
                .iter()
                .enumerate()
                .filter(|(_, s)| f(s))
                .map(|(i, _)| i as u32)
                .collect::<Vec<u32>>()
        };
        assert_eq!(
            sorted(h.queues.entries(QueueId::ActiveAndRegenerated)),
            expect(|s| *s == RayState::Active)
        );
        assert_eq!(
            sorted(h.queues.entries(QueueId::HitBackgroundUpdateBufferToRegenerate)),
            expect(|s| s.needs_buffer_update())
        );
    }

    #[test]
    fn slots_are_sorted_into_queues_by_state() {
        check_partition(EarlyExit::GuardedSkip);
    }

    #[test]
    fn returning_lanes_do_not_disturb_compaction() {
        check_partition(EarlyExit::Return);
    }
}
