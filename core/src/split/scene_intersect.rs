//! Scene intersect

use super::*;
use crate::queue::QueueId;
use crate::state::RayState;

/// Promotes `Regenerated` slots to `Active` and intersects the rays of `Active` slots. A miss moves the slot to
/// `HitBackground`.
pub struct SceneIntersect;

impl SplitKernel for SceneIntersect {
    fn name(&self) -> &'static str {
        "scene_intersect"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        for lane in wg.lanes() {
            let Some(ray_index) = wg.ray_index(ctx.queues, lane, QueueId::ActiveAndRegenerated, false) else {
                wg.exit(lane);
                continue;
            };

            let mut slot = ctx.store.lease(ray_index);
            if slot.is_state(RayState::Regenerated) {
                slot.set_state(RayState::Active);
            }
            if !slot.is_state(RayState::Active) {
                continue;
            }

            if let Some(debug) = slot.debug.as_deref_mut() {
                debug.num_intersections += 1;
            }

            match ctx.integrator.intersect(slot.path_state, slot.ray) {
                Some(isect) => *slot.isect = isect,
                None => {
                    slot.isect.t = slot.ray.t_max;
                    slot.set_state(RayState::HitBackground);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KernelData, LaunchConfig};
    use crate::math::INFINITY;
    use crate::split::DataInit;
    use crate::testing::Harness;

    #[test]
    fn regenerated_slots_become_active_or_miss() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 1);
        let h = Harness::new(config, KernelData::default());
        h.run(&DataInit, false);

        h.run(&SceneIntersect, true);

        for i in 0..4 {
            let slot = h.store.lease(i);
            let depth = h.integrator.depth(slot.work.pixel_x, slot.work.pixel_y);
            if depth == 0 {
                assert_eq!(slot.state(), RayState::HitBackground);
                assert_eq!(slot.isect.t, INFINITY);
            } else {
                assert_eq!(slot.state(), RayState::Active);
                assert_eq!(slot.isect.t, 1.0);
            }
        }

        // Intersection does not consume the queue.
        assert_eq!(h.queues.len(QueueId::ActiveAndRegenerated), 4);
        assert!(!h.queues.entries(QueueId::ActiveAndRegenerated).contains(&crate::queue::QUEUE_EMPTY_SLOT));
    }

    #[test]
    fn compacted_dispatch_only_visits_queued_slots() {
        let config = LaunchConfig::for_tile(0, 0, 2, 1, 2, 1, 0, 1);
        let h = Harness::new(config, KernelData::default());
        h.run(&DataInit, false);
        h.queues.reset(QueueId::ActiveAndRegenerated);

        // The dispatch mode comes from the launch config.
        h.run(&SceneIntersect, true);
        assert_eq!(h.store.state(0), RayState::Regenerated);
        assert_eq!(h.store.state(1), RayState::Regenerated);

        h.run(&SceneIntersect, false);
        assert_ne!(h.store.state(0), RayState::Regenerated);
        assert_ne!(h.store.state(1), RayState::Regenerated);
    }

    #[test]
    fn other_states_are_left_alone() {
        let config = LaunchConfig::for_tile(0, 0, 2, 1, 2, 1, 0, 1);
        let h = Harness::new(config, KernelData::default());
        h.run(&DataInit, false);
        h.store.set_state(0, RayState::UpdateBuffer);
        h.store.set_state(1, RayState::Inactive);

        h.run(&SceneIntersect, false);

        assert_eq!(h.store.state(0), RayState::UpdateBuffer);
        assert_eq!(h.store.state(1), RayState::Inactive);
    }
}
