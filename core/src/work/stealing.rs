//! Work Stealing Allocator

use super::*;
use crate::math::div_ceil;
use crate::{stat_counter, stat_inc, stat_register_fns};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

stat_counter!("Work/Work units stolen", WORK_UNITS_STOLEN, work_stats_stolen);
stat_register_fns!(work_stats_stolen);

/// A block of tile pixels sharing one work counter.
#[derive(Clone, Copy, Debug)]
struct Partition {
    /// Block origin relative to the tile.
    x0: u32,
    y0: u32,

    /// Block size clipped to the tile.
    width: u32,
    height: u32,

    /// Number of units in the block.
    total: u32,
}

/// Splits the tile into partitions with their own counters. Units are numbered sample major within a partition, so
/// the first claims of a partition cover every pixel once before any pixel gets its second sample.
pub struct WorkStealingAllocator {
    /// Tile origin.
    x: u32,
    y: u32,

    /// Tile width.
    width: usize,

    /// Slots per pixel.
    parallel_samples: usize,

    /// First sample.
    start_sample: u32,

    /// Partition size in pixels.
    partition_width: usize,
    partition_height: usize,

    /// Number of partitions along x.
    partitions_x: usize,

    partitions: Vec<Partition>,
    counters: Vec<AtomicU32>,
    exhausted: Vec<AtomicBool>,
}

impl WorkStealingAllocator {
    /// Create the allocator.
    ///
    /// * `config`         - Launch configuration of the tile.
    /// * `partition_size` - Partition width and height in pixels.
    pub fn new(config: &LaunchConfig, partition_size: (usize, usize)) -> Result<Self, String> {
        register_stats();

        let (partition_width, partition_height) = partition_size;
        if partition_width == 0 || partition_height == 0 {
            return Err(format!(
                "Partition size {partition_width}x{partition_height} has no pixels"
            ));
        }

        let partitions_x = div_ceil(config.width, partition_width);
        let partitions_y = div_ceil(config.height, partition_height);
        let num_samples = config.num_samples() as u64;

        let mut partitions = Vec::with_capacity(partitions_x * partitions_y);
        for py in 0..partitions_y {
            for px in 0..partitions_x {
                let x0 = px * partition_width;
                let y0 = py * partition_height;
                let width = partition_width.min(config.width - x0);
                let height = partition_height.min(config.height - y0);
                let total = (width * height) as u64 * num_samples;
                if total >= u32::MAX as u64 {
                    return Err(format!("Partition has {total} work units, too many for a counter"));
                }
                partitions.push(Partition {
                    x0: x0 as u32,
                    y0: y0 as u32,
                    width: width as u32,
                    height: height as u32,
                    total: total as u32,
                });
            }
        }

        let n = partitions.len();
        Ok(Self {
            x: config.x as u32,
            y: config.y as u32,
            width: config.width,
            parallel_samples: config.parallel_samples,
            start_sample: config.start_sample,
            partition_width,
            partition_height,
            partitions_x,
            partitions,
            counters: (0..n).map(|_| AtomicU32::new(0)).collect(),
            exhausted: (0..n).map(|_| AtomicBool::new(false)).collect(),
        })
    }

    /// Returns the number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Returns the partition containing the pixel a slot's lane maps to.
    ///
    /// * `slot` - Slot index.
    pub fn home_partition(&self, slot: usize) -> usize {
        let row = self.width * self.parallel_samples;
        let px = (slot % row) / self.parallel_samples;
        let py = slot / row;
        let partition = (py / self.partition_height) * self.partitions_x + px / self.partition_width;
        partition.min(self.partitions.len() - 1)
    }

    /// Claim a unit from one partition.
    fn claim(&self, partition: usize) -> Option<WorkUnit> {
        if self.exhausted[partition].load(Ordering::Acquire) {
            return None;
        }

        let p = &self.partitions[partition];
        let work = self.counters[partition].fetch_add(1, Ordering::AcqRel);
        if work >= p.total {
            self.exhausted[partition].store(true, Ordering::Release);
            return None;
        }

        let pixels = p.width * p.height;
        let pixel = work % pixels;
        let tile_x = p.x0 + pixel % p.width;
        let tile_y = p.y0 + pixel / p.width;
        Some(WorkUnit {
            sample: self.start_sample + work / pixels,
            pixel_x: self.x + tile_x,
            pixel_y: self.y + tile_y,
            tile_x,
            tile_y,
            sample_slot: 0,
        })
    }

    /// Claim from the home partition and steal from the following partitions once it is exhausted.
    fn claim_any(&self, slot: usize) -> Option<WorkUnit> {
        let home = self.home_partition(slot);
        let n = self.partitions.len();
        (0..n).find_map(|k| {
            let unit = self.claim((home + k) % n);
            if unit.is_some() && k > 0 {
                stat_inc!(WORK_UNITS_STOLEN, 1);
            }
            unit
        })
    }
}

impl WorkAllocator for WorkStealingAllocator {
    fn first_work(&self, slot: usize) -> Option<WorkUnit> {
        self.claim_any(slot)
    }

    fn next_work(&self, slot: usize, _current: &WorkUnit) -> Option<WorkUnit> {
        self.claim_any(slot)
    }

    fn is_exhausted(&self) -> bool {
        self.partitions
            .iter()
            .zip(self.counters.iter())
            .all(|(p, c)| c.load(Ordering::Acquire) >= p.total)
    }

    fn total_work(&self) -> u64 {
        self.partitions.iter().map(|p| p.total as u64).sum()
    }
}
