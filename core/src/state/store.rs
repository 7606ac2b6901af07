//! Ray State Store

use super::*;
use crate::geometry::*;
use crate::rng::RngStream;
use crate::spectrum::*;
use crate::work::WorkUnit;
use crate::{stat_inc, stat_memory_counter, stat_register_fns};
use std::cell::UnsafeCell;
use std::mem::size_of;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

stat_memory_counter!("Memory/Ray state store", RAY_STATE_MEMORY, ray_state_stats_memory);
stat_register_fns!(ray_state_stats_memory);

/// Slot indexed storage of every in-flight path. Each attribute lives in its own array.
///
/// Lanes get mutable access to a slot through `lease()`. Only one lease per slot may exist at a time; a second lease
/// of the same slot is a scheduling bug and panics.
pub struct RayStateStore {
    /// Slot states. Atomic so the host can scan them between dispatches.
    ray_state: Vec<AtomicU8>,

    /// Lease markers.
    owners: Vec<AtomicBool>,

    throughput: Vec<UnsafeCell<Spectrum>>,
    radiance: Vec<UnsafeCell<PathRadiance>>,
    path_state: Vec<UnsafeCell<PathState>>,
    ray: Vec<UnsafeCell<Ray>>,
    isect: Vec<UnsafeCell<Intersection>>,
    rng: Vec<UnsafeCell<RngStream>>,
    work: Vec<UnsafeCell<WorkUnit>>,

    /// Debug records; only allocated when the debug pass is recorded.
    debug: Option<Vec<UnsafeCell<DebugData>>>,
}

// Cells are only reached through a `RaySlot`, and `lease()` hands out at most one `RaySlot` per index.
unsafe impl Sync for RayStateStore {}

impl RayStateStore {
    /// Allocate storage for `num_slots` slots, all `Inactive`.
    ///
    /// * `num_slots` - Number of slots.
    /// * `debug`     - Allocate debug records.
    pub fn new(num_slots: usize, debug: bool) -> Self {
        register_stats();

        fn cells<T: Default>(n: usize) -> Vec<UnsafeCell<T>> {
            (0..n).map(|_| UnsafeCell::new(T::default())).collect()
        }

        let per_slot = size_of::<AtomicU8>()
            + size_of::<AtomicBool>()
            + size_of::<Spectrum>()
            + size_of::<PathRadiance>()
            + size_of::<PathState>()
            + size_of::<Ray>()
            + size_of::<Intersection>()
            + size_of::<RngStream>()
            + size_of::<WorkUnit>()
            + if debug { size_of::<DebugData>() } else { 0 };
        stat_inc!(RAY_STATE_MEMORY, (per_slot * num_slots) as u64);

        Self {
            ray_state: (0..num_slots).map(|_| AtomicU8::new(RayState::Inactive as u8)).collect(),
            owners: (0..num_slots).map(|_| AtomicBool::new(false)).collect(),
            throughput: cells(num_slots),
            radiance: cells(num_slots),
            path_state: cells(num_slots),
            ray: cells(num_slots),
            isect: cells(num_slots),
            rng: cells(num_slots),
            work: cells(num_slots),
            debug: debug.then(|| cells(num_slots)),
        }
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.ray_state.len()
    }

    /// Returns true if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.ray_state.is_empty()
    }

    /// Returns true if debug records are kept.
    pub fn has_debug(&self) -> bool {
        self.debug.is_some()
    }

    /// Returns the state of a slot.
    ///
    /// * `index` - Slot index.
    pub fn state(&self, index: usize) -> RayState {
        load_state(&self.ray_state[index])
    }

    /// Set the state of a slot.
    ///
    /// * `index` - Slot index.
    /// * `state` - New state.
    pub fn set_state(&self, index: usize, state: RayState) {
        self.ray_state[index].store(state as u8, Ordering::Release);
    }

    /// Returns a snapshot of all slot states.
    pub fn states(&self) -> Vec<RayState> {
        self.ray_state.iter().map(load_state).collect()
    }

    /// Returns the number of slots in the given state.
    ///
    /// * `state` - State to count.
    pub fn count(&self, state: RayState) -> usize {
        self.ray_state
            .iter()
            .filter(|s| s.load(Ordering::Acquire) == state as u8)
            .count()
    }

    /// Returns true if every slot is `Inactive`.
    pub fn all_inactive(&self) -> bool {
        self.count(RayState::Inactive) == self.len()
    }

    /// Take exclusive access to a slot. The slot is released when the returned `RaySlot` is dropped.
    ///
    /// * `index` - Slot index.
    pub fn lease(&self, index: usize) -> RaySlot<'_> {
        let taken = self.owners[index].swap(true, Ordering::Acquire);
        assert!(!taken, "Slot {index} is already owned by another lane");

        // SAFETY: the owner flag guarantees no other `RaySlot` refers to these cells until this one is dropped.
        unsafe {
            RaySlot {
                store: self,
                index,
                throughput: &mut *self.throughput[index].get(),
                radiance: &mut *self.radiance[index].get(),
                path_state: &mut *self.path_state[index].get(),
                ray: &mut *self.ray[index].get(),
                isect: &mut *self.isect[index].get(),
                rng: &mut *self.rng[index].get(),
                work: &mut *self.work[index].get(),
                debug: self.debug.as_ref().map(|d| &mut *d[index].get()),
            }
        }
    }

    /// Reset every slot to `Inactive` and clear all attributes.
    pub fn reset(&mut self) {
        for s in self.ray_state.iter_mut() {
            *s.get_mut() = RayState::Inactive as u8;
        }
        for o in self.owners.iter_mut() {
            *o.get_mut() = false;
        }
        self.throughput.iter_mut().for_each(|c| *c.get_mut() = Spectrum::default());
        self.radiance.iter_mut().for_each(|c| *c.get_mut() = PathRadiance::default());
        self.path_state.iter_mut().for_each(|c| *c.get_mut() = PathState::default());
        self.ray.iter_mut().for_each(|c| *c.get_mut() = Ray::default());
        self.isect.iter_mut().for_each(|c| *c.get_mut() = Intersection::default());
        self.rng.iter_mut().for_each(|c| *c.get_mut() = RngStream::default());
        self.work.iter_mut().for_each(|c| *c.get_mut() = WorkUnit::default());
        if let Some(debug) = self.debug.as_mut() {
            debug.iter_mut().for_each(|c| *c.get_mut() = DebugData::default());
        }
    }
}

fn load_state(s: &AtomicU8) -> RayState {
    let v = s.load(Ordering::Acquire);
    RayState::from_u8(v).unwrap_or_else(|| panic!("Invalid ray state {v}"))
}

/// Exclusive access to one slot of a `RayStateStore`.
pub struct RaySlot<'a> {
    store: &'a RayStateStore,
    index: usize,
    pub throughput: &'a mut Spectrum,
    pub radiance: &'a mut PathRadiance,
    pub path_state: &'a mut PathState,
    pub ray: &'a mut Ray,
    pub isect: &'a mut Intersection,
    pub rng: &'a mut RngStream,
    pub work: &'a mut WorkUnit,
    pub debug: Option<&'a mut DebugData>,
}

impl<'a> RaySlot<'a> {
    /// Returns the slot index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the slot state.
    pub fn state(&self) -> RayState {
        self.store.state(self.index)
    }

    /// Returns true if the slot is in the given state.
    ///
    /// * `state` - State to test.
    pub fn is_state(&self, state: RayState) -> bool {
        self.state() == state
    }

    /// Set the slot state.
    ///
    /// * `state` - New state.
    pub fn set_state(&self, state: RayState) {
        self.store.set_state(self.index, state);
    }
}

impl<'a> Drop for RaySlot<'a> {
    fn drop(&mut self) {
        self.store.owners[self.index].store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_inactive() {
        let store = RayStateStore::new(8, false);
        assert_eq!(store.len(), 8);
        assert!(store.all_inactive());
        assert!(!store.has_debug());
        assert!(store.lease(3).debug.is_none());
    }

    #[test]
    fn lease_writes_are_visible_to_next_lease() {
        let store = RayStateStore::new(4, true);
        {
            let mut slot = store.lease(2);
            *slot.throughput = Spectrum::new(0.5);
            slot.path_state.bounce = 3;
            slot.set_state(RayState::Active);
        }
        let slot = store.lease(2);
        assert_eq!(*slot.throughput, Spectrum::new(0.5));
        assert_eq!(slot.path_state.bounce, 3);
        assert!(slot.is_state(RayState::Active));
        assert_eq!(store.count(RayState::Active), 1);
    }

    #[test]
    #[should_panic(expected = "already owned")]
    fn double_lease_panics() {
        let store = RayStateStore::new(2, false);
        let _a = store.lease(1);
        let _b = store.lease(1);
    }

    #[test]
    fn reset_clears_slots() {
        let mut store = RayStateStore::new(2, false);
        {
            let mut slot = store.lease(0);
            slot.set_state(RayState::ToRegenerate);
            slot.radiance.transparent = 1.0;
        }
        store.reset();
        assert!(store.all_inactive());
        assert_eq!(store.lease(0).radiance.transparent, 0.0);
    }

    #[test]
    fn concurrent_leases_of_distinct_slots() {
        let store = RayStateStore::new(64, false);
        crossbeam::scope(|scope| {
            for t in 0..4 {
                let store = &store;
                scope.spawn(move |_| {
                    for i in (t..64).step_by(4) {
                        let mut slot = store.lease(i);
                        slot.path_state.sample = i as u32;
                        slot.set_state(RayState::Regenerated);
                    }
                });
            }
        })
        .unwrap();
        assert_eq!(store.count(RayState::Regenerated), 64);
        assert_eq!(store.lease(17).path_state.sample, 17);
    }
}
