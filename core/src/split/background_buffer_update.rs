//! Background, buffer update and regeneration

use super::regenerate::regenerate;
use super::*;
use crate::config::PassFlags;
use crate::queue::QueueId;
use crate::stat_inc;
use crate::state::*;

/// Consumes the buffer update queue.
///
/// * `HitBackground`: camera rays against a transparent film add to the slot's transparency; unless that alone
///   finishes the sample the background is evaluated and accumulated. Moves to `UpdateBuffer`.
/// * `UpdateBuffer`: writes the sample to the output and ends its random stream. Moves to `ToRegenerate`.
/// * `ToRegenerate`: claims the next unit and starts a new path, or goes `Inactive` once the allocator is dry.
///
/// Regenerated slots are enqueued into the active queue.
pub struct BackgroundBufferUpdate;

impl SplitKernel for BackgroundBufferUpdate {
    fn name(&self) -> &'static str {
        "background_buffer_update"
    }

    fn execute(&self, ctx: &KernelContext, wg: &mut Workgroup) {
        let queue = QueueId::HitBackgroundUpdateBufferToRegenerate;
        let mut enqueue = vec![None; wg.local_size()];

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
            if slot.is_state(RayState::HitBackground) {
                background(ctx, &mut slot);
            }
            if slot.is_state(RayState::UpdateBuffer) {
                update_buffer(ctx, &mut slot);
            }
            if slot.is_state(RayState::ToRegenerate) {
                let next = ctx.allocator.next_work(ray_index, slot.work);
                if regenerate(ctx, &mut slot, next) {
                    enqueue[lane] = Some(ray_index);
                }
            }
        }

        wg.enqueue_ray_index_local(ctx.queues, QueueId::ActiveAndRegenerated, &enqueue);
    }
}

/// Resolve a ray that left the scene.
fn background(ctx: &KernelContext, slot: &mut RaySlot) {
    let kd = ctx.kernel_data;
    let throughput = *slot.throughput;

    if kd.background.transparent && slot.path_state.is_camera_ray() {
        slot.radiance.accum_transparent(throughput);
        if !kd.film.pass_flags.contains(PassFlags::BACKGROUND) {
            slot.set_state(RayState::UpdateBuffer);
            return;
        }
    }

    let l_background = ctx.integrator.sample_background(slot.path_state, slot.ray);
    let bounce = slot.path_state.bounce;
    slot.radiance.accum_background(throughput, l_background, bounce);
    slot.set_state(RayState::UpdateBuffer);
}

/// Write the finished sample to the output.
fn update_buffer(ctx: &KernelContext, slot: &mut RaySlot) {
    let output = &ctx.buffers.output;
    let unit = *slot.work;
    let offset = output.sample_offset(ctx.config, &unit);

    let l_sum = slot.radiance.clamp_and_sum(ctx.kernel_data);
    output.write_light_passes(offset, slot.radiance);
    let bounces = slot.path_state.bounce;
    if let Some(debug) = slot.debug.as_deref_mut() {
        debug.num_bounces = bounces;
        output.write_debug_passes(offset, debug);
    }
    output.write_combined(offset, l_sum, slot.radiance.alpha());
    output.write_sample_count(offset);
    ctx.buffers.rng_state.end_stream(unit.pixel_x, unit.pixel_y, slot.rng);
    stat_inc!(SAMPLES_WRITTEN, 1);

    slot.set_state(RayState::ToRegenerate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KernelData, LaunchConfig};
    use crate::spectrum::Spectrum;
    use crate::split::DataInit;
    use crate::testing::Harness;
    use crate::work::WorkUnit;
    use float_cmp::*;

    fn transparent_harness(end_sample: u32) -> Harness {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, end_sample);
        let mut kd = KernelData::default();
        kd.background.transparent = true;
        let h = Harness::new(config, kd);
        h.run(&DataInit, false);
        h
    }

    /// Slots 0 and 2 hit the background with half throughput, slots 1 and 3 keep tracing.
    fn hit_background(h: &Harness) -> Vec<WorkUnit> {
        h.queues.reset(QueueId::ActiveAndRegenerated);
        let mut units = Vec::new();
        for i in 0..4 {
            let mut slot = h.store.lease(i);
            if i % 2 == 0 {
                *slot.throughput = Spectrum::new(0.5);
                slot.set_state(RayState::HitBackground);
                units.push(*slot.work);
                h.queues.push(QueueId::HitBackgroundUpdateBufferToRegenerate, i as u32);
            } else {
                slot.set_state(RayState::Active);
            }
        }
        units
    }

    #[test]
    fn transparent_hits_regenerate_when_work_remains() {
        let h = transparent_harness(2);
        let units = hit_background(&h);

        h.run(&BackgroundBufferUpdate, true);

        for u in units.iter() {
            let (x, y) = (u.tile_x as usize, u.tile_y as usize);
            let c = h.buffers.output.combined(x, y);
            assert!(approx_eq!(f32, c[3], 0.5));
            assert_eq!(&c[..3], &[0.0, 0.0, 0.0]);
            assert_eq!(h.buffers.output.sample_count(x, y), Some(1.0));
        }
        for i in [0, 2] {
            let slot = h.store.lease(i);
            assert_eq!(slot.state(), RayState::Regenerated);
            assert_eq!(*slot.throughput, Spectrum::ONE);
            assert_eq!(*slot.radiance, PathRadiance::new(false));
            assert_eq!(slot.work.sample, 1);
            assert!(slot.path_state.is_camera_ray());
        }
        assert_eq!(h.store.state(1), RayState::Active);
        assert_eq!(h.store.state(3), RayState::Active);

        let mut active = h.queues.entries(QueueId::ActiveAndRegenerated);
        active.sort_unstable();
        assert_eq!(active, vec![0, 2]);
        assert!(h.queues.is_empty(QueueId::HitBackgroundUpdateBufferToRegenerate));
    }

    #[test]
    fn transparent_hits_retire_without_work() {
        let h = transparent_harness(1);
        let units = hit_background(&h);

        h.run(&BackgroundBufferUpdate, true);

        for u in units.iter() {
            let c = h.buffers.output.combined(u.tile_x as usize, u.tile_y as usize);
            assert!(approx_eq!(f32, c[3], 0.5));
        }
        assert_eq!(h.store.state(0), RayState::Inactive);
        assert_eq!(h.store.state(2), RayState::Inactive);
        assert!(h.queues.is_empty(QueueId::ActiveAndRegenerated));
    }

    #[test]
    fn background_is_evaluated_when_its_pass_is_recorded() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 1);
        let mut kd = KernelData::default();
        kd.background.transparent = true;
        kd.film.pass_flags |= PassFlags::BACKGROUND;
        let h = Harness::new(config, kd);
        h.run(&DataInit, false);
        let units = hit_background(&h);

        h.run(&BackgroundBufferUpdate, true);

        let layout = *h.buffers.output.layout();
        let pass = layout.background.unwrap();
        for u in units.iter() {
            let (x, y) = (u.tile_x as usize, u.tile_y as usize);
            let background = h.buffers.output.pixel_pass(x, y, pass, 3);
            assert!(approx_eq!(f32, background[0], 0.5));

            // Transparent background is left out of the combined pass.
            let c = h.buffers.output.combined(x, y);
            assert_eq!(&c[..3], &[0.0, 0.0, 0.0]);
            assert!(approx_eq!(f32, c[3], 0.5));
        }
    }

    #[test]
    fn exhausted_allocator_retires_every_slot_in_one_pass() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 1);
        let h = Harness::new(config, KernelData::default());
        h.run(&DataInit, false);
        h.queues.reset(QueueId::ActiveAndRegenerated);
        for i in 0..4 {
            h.store.set_state(i, RayState::UpdateBuffer);
            h.queues.push(QueueId::HitBackgroundUpdateBufferToRegenerate, i as u32);
        }

        h.run(&BackgroundBufferUpdate, true);

        assert!(h.store.all_inactive());
        assert_eq!(h.queues.len(QueueId::ActiveAndRegenerated), 0);
        assert!(h.allocator.is_exhausted());
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert_eq!(h.buffers.output.sample_count(x, y), Some(1.0));
        }
    }

    #[test]
    fn dense_dispatch_skips_slots_that_are_not_finished() {
        let config = LaunchConfig::for_tile(0, 0, 2, 2, 2, 1, 0, 1);
        let h = Harness::new(config, KernelData::default());
        h.run(&DataInit, false);
        h.store.set_state(3, RayState::UpdateBuffer);

        h.run(&BackgroundBufferUpdate, false);

        assert_eq!(h.store.state(3), RayState::Inactive);
        for i in 0..3 {
            assert_eq!(h.store.state(i), RayState::Regenerated);
        }
    }
}
