//! Lamp emission

use super::*;
use crate::queue::QueueId;
use crate::stat_inc;
use crate::state::RayState;

/// Multiple importance sampling of emitters hit by continuation rays. Consumes the active queue.
///
/// For `Active` and `HitBackground` slots that are past the camera ray, the ray from the last bounce to the current
/// hit (or to the end of the ray on a miss) is handed to the integrator and any emission found is accumulated. No
/// state changes.
pub struct LampEmission;

impl SplitKernel for LampEmission {
    fn name(&self) -> &'static str {
        "lamp_emission"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        let queue = QueueId::ActiveAndRegenerated;

        for lane in wg.lanes() {
            if wg.global_id(lane) == 0 {
                // This stage empties the queue.
                ctx.queues.reset(queue);
            }

            let Some(ray_index) = wg.ray_index(ctx.queues, lane, queue, true) else {
                wg.exit(lane);
                continue;
            };

            let mut slot = ctx.store.lease(ray_index);
            if !(slot.is_state(RayState::Active) || slot.is_state(RayState::HitBackground)) {
                continue;
            }
            if !ctx.kernel_data.integrator.use_lamp_mis || slot.path_state.is_camera_ray() {
                continue;
            }

            let ray = *slot.ray;
            let mut light_ray = ray;
            light_ray.o = ray.o - ray.d * slot.path_state.ray_t;
            slot.path_state.ray_t += slot.isect.t;
            light_ray.t_max = slot.path_state.ray_t;

            if let Some(emission) = ctx.integrator.sample_emitter_along_ray(slot.path_state, &light_ray) {
                let throughput = *slot.throughput;
                let bounce = slot.path_state.bounce;
                slot.radiance.accum_emission(throughput, emission, bounce);
                if let Some(debug) = slot.debug.as_deref_mut() {
                    debug.num_emitter_hits += 1;
                }
                stat_inc!(LAMP_EMISSION_HITS, 1);
            }
        }
    }
}
