//! Path regeneration shared by data init and buffer update

use super::{KernelContext, DEGENERATE_SAMPLES, PATHS_REGENERATED};
use crate::spectrum::*;
use crate::stat_inc;
use crate::state::*;
use crate::work::WorkUnit;

/// Start a new path for the slot from `unit`. Units whose camera ray has zero extent are written as black and the
/// next unit is claimed, until a path starts or the allocator runs dry.
///
/// Returns true if the slot is now `Regenerated`; otherwise it is `Inactive`.
///
/// * `ctx`  - Kernel context.
/// * `slot` - The slot.
/// * `unit` - First unit to try.
pub(super) fn regenerate(ctx: &KernelContext, slot: &mut RaySlot, mut unit: Option<WorkUnit>) -> bool {
    let output = &ctx.buffers.output;
    let rng_state = &ctx.buffers.rng_state;

    while let Some(u) = unit {
        *slot.work = u;
        *slot.rng = rng_state.stream(u.sample, u.pixel_x, u.pixel_y);
        let ray = ctx
            .camera
            .generate_initial_ray(slot.rng, u.sample, u.pixel_x, u.pixel_y);

        if !ray.is_degenerate() {
            *slot.ray = ray;
            *slot.throughput = Spectrum::ONE;
            slot.radiance.init(ctx.kernel_data.film.use_light_pass());
            *slot.path_state = PathState::new(u.sample);
            if let Some(debug) = slot.debug.as_deref_mut() {
                *debug = DebugData::default();
            }
            slot.set_state(RayState::Regenerated);
            stat_inc!(PATHS_REGENERATED, 1);
            return true;
        }

        let offset = output.sample_offset(ctx.config, &u);
        output.write_combined(offset, Spectrum::ZERO, 0.0);
        output.write_sample_count(offset);
        rng_state.end_stream(u.pixel_x, u.pixel_y, slot.rng);
        stat_inc!(DEGENERATE_SAMPLES, 1);

        unit = ctx.allocator.next_work(slot.index(), &u);
    }

    slot.set_state(RayState::Inactive);
    false
}
