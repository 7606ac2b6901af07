//! Strided Allocator

use super::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Gives every slot a fixed pixel and sample slot. Slot `i` renders pixel `i / parallel_samples` and the samples
/// `start + i % parallel_samples`, `start + i % parallel_samples + parallel_samples`, ... below the end sample.
pub struct StridedAllocator {
    /// Tile origin.
    x: u32,
    y: u32,

    /// Tile size.
    width: usize,
    height: usize,

    /// Slots per pixel.
    parallel_samples: usize,

    /// Sample range.
    start_sample: u32,
    end_sample: u32,

    /// Slots that ran out of work.
    retired: Vec<AtomicBool>,

    /// Number of retired slots.
    num_retired: AtomicUsize,
}

impl StridedAllocator {
    /// Create the allocator.
    ///
    /// * `config` - Launch configuration of the tile.
    pub fn new(config: &LaunchConfig) -> Self {
        let num_slots = config.num_slots();
        Self {
            x: config.x as u32,
            y: config.y as u32,
            width: config.width,
            height: config.height,
            parallel_samples: config.parallel_samples,
            start_sample: config.start_sample,
            end_sample: config.end_sample,
            retired: (0..num_slots).map(|_| AtomicBool::new(false)).collect(),
            num_retired: AtomicUsize::new(0),
        }
    }

    /// Returns the unit for a slot and sample or retires the slot when the sample is out of range.
    fn unit(&self, slot: usize, sample: u32) -> Option<WorkUnit> {
        if sample >= self.end_sample {
            if !self.retired[slot].swap(true, Ordering::AcqRel) {
                self.num_retired.fetch_add(1, Ordering::AcqRel);
            }
            return None;
        }

        let tile_index = slot / self.parallel_samples;
        let tile_x = (tile_index % self.width) as u32;
        let tile_y = (tile_index / self.width) as u32;
        Some(WorkUnit {
            sample,
            pixel_x: self.x + tile_x,
            pixel_y: self.y + tile_y,
            tile_x,
            tile_y,
            sample_slot: (slot % self.parallel_samples) as u32,
        })
    }
}

impl WorkAllocator for StridedAllocator {
    fn first_work(&self, slot: usize) -> Option<WorkUnit> {
        self.unit(slot, self.start_sample.saturating_add((slot % self.parallel_samples) as u32))
    }

    fn next_work(&self, slot: usize, current: &WorkUnit) -> Option<WorkUnit> {
        self.unit(slot, current.sample.saturating_add(self.parallel_samples as u32))
    }

    fn is_exhausted(&self) -> bool {
        self.num_retired.load(Ordering::Acquire) == self.retired.len()
    }

    fn total_work(&self) -> u64 {
        (self.width * self.height) as u64 * (self.end_sample - self.start_sample) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn slot_owns_pixel_and_sample_slot() {
        let config = LaunchConfig::for_tile(8, 4, 3, 2, 16, 2, 10, 15);
        let allocator = StridedAllocator::new(&config);

        // Slot 7 -> pixel 3 -> (0, 1), sample slot 1.
        let u = allocator.first_work(7).unwrap();
        assert_eq!((u.tile_x, u.tile_y, u.pixel_x, u.pixel_y), (0, 1, 8, 5));
        assert_eq!((u.sample, u.sample_slot), (11, 1));

        let u = allocator.next_work(7, &u).unwrap();
        assert_eq!(u.sample, 13);
        assert!(allocator.next_work(7, &u).is_none());
    }

    #[test]
    fn exhausted_once_every_slot_retired() {
        let config = LaunchConfig::for_tile(0, 0, 1, 1, 1, 2, 0, 1);
        let allocator = StridedAllocator::new(&config);
        let u = allocator.first_work(0).unwrap();
        assert!(allocator.first_work(1).is_none());
        assert!(!allocator.is_exhausted());
        assert!(allocator.next_work(0, &u).is_none());
        assert!(allocator.is_exhausted());

        // Retiring twice does not count twice.
        assert!(allocator.next_work(0, &u).is_none());
        assert!(allocator.is_exhausted());
    }

    #[test]
    fn large_tiles_do_not_overflow() {
        let config = LaunchConfig::for_tile(0, 0, 65536, 1, 65536, 1, 0, 70000);
        assert!(config.validate().is_ok());
        let allocator = StridedAllocator::new(&config);
        assert_eq!(allocator.total_work(), 65536 * 70000);

        let current = WorkUnit {
            sample: 65535,
            tile_x: 1,
            pixel_x: 1,
            ..WorkUnit::default()
        };
        let u = allocator.next_work(1, &current).unwrap();
        assert_eq!((u.sample, u.tile_x, u.pixel_x), (65536, 1, 1));
    }

    #[test]
    fn samples_near_the_end_of_the_range_retire() {
        let config = LaunchConfig::for_tile(0, 0, 1, 1, 1, 2, u32::MAX - 3, u32::MAX);
        let allocator = StridedAllocator::new(&config);
        let u = allocator.first_work(1).unwrap();
        assert_eq!(u.sample, u32::MAX - 2);
        assert!(allocator.next_work(1, &u).is_none());

        let last = WorkUnit {
            sample: u32::MAX - 1,
            ..u
        };
        assert!(allocator.next_work(0, &last).is_none());
    }

    proptest! {
        #[test]
        fn covers_sample_space_once(
            width in 1_usize..6,
            height in 1_usize..6,
            parallel_samples in 1_usize..5,
            start in 0_u32..3,
            num_samples in 1_u32..7,
        ) {
            let config = LaunchConfig::for_tile(0, 0, width, height, width, parallel_samples, start, start + num_samples);
            let allocator = StridedAllocator::new(&config);

            let mut seen = HashSet::new();
            for slot in 0..config.num_slots() {
                let mut unit = allocator.first_work(slot);
                while let Some(u) = unit {
                    prop_assert_eq!(u.sample_slot as usize, slot % parallel_samples);
                    prop_assert!(seen.insert((u.tile_x, u.tile_y, u.sample)));
                    unit = allocator.next_work(slot, &u);
                }
            }
            prop_assert_eq!(seen.len() as u64, allocator.total_work());
            prop_assert!(allocator.is_exhausted());
        }
    }
}
