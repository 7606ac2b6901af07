//! Shade surface

use super::*;
use crate::queue::QueueId;
use crate::state::RayState;

/// Shades the hits of `Active` slots. Emission is accumulated; the path either continues with the scattered ray or
/// moves to `UpdateBuffer` when it does not scatter, its throughput is black or it reached the bounce limit.
pub struct ShadeSurface;

impl SplitKernel for ShadeSurface {
    fn name(&self) -> &'static str {
        "shade_surface"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        let max_bounce = ctx.kernel_data.integrator.max_bounce;

        for lane in wg.lanes() {
            let Some(ray_index) = wg.ray_index(ctx.queues, lane, QueueId::ActiveAndRegenerated, false) else {
                wg.exit(lane);
                continue;
            };

            let mut slot = ctx.store.lease(ray_index);
            if !slot.is_state(RayState::Active) {
                continue;
            }

            let shade = ctx
                .integrator
                .shade_surface(slot.path_state, slot.ray, slot.isect, slot.rng);

            let throughput = *slot.throughput;
            let bounce = slot.path_state.bounce;
            if !shade.emission.is_black() {
                slot.radiance.accum_emission(throughput, shade.emission, bounce);
            }

            match shade.scatter {
                Some(scatter) if bounce < max_bounce && !(throughput * scatter.weight).is_black() => {
                    *slot.throughput = throughput * scatter.weight;
                    *slot.ray = scatter.ray;
                    slot.path_state.next_bounce(scatter.flags);
                }
                _ => slot.set_state(RayState::UpdateBuffer),
            }
        }
    }
}
