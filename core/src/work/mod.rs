//! Work allocation

mod stealing;
mod strided;

// Re-export
pub use stealing::*;
pub use strided::*;

use crate::config::LaunchConfig;
use std::fmt;
use std::str::FromStr;

/// A (pixel, sample) unit of work owned by a slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    /// Sample number.
    pub sample: u32,

    /// Pixel x-coordinate in the image.
    pub pixel_x: u32,

    /// Pixel y-coordinate in the image.
    pub pixel_y: u32,

    /// Pixel x-coordinate relative to the tile origin.
    pub tile_x: u32,

    /// Pixel y-coordinate relative to the tile origin.
    pub tile_y: u32,

    /// Output buffer sample slot the unit is written to.
    pub sample_slot: u32,
}

/// Hands out work units to slots as they retire.
///
/// Claims are mutually exclusive. `None` means the slot has no more work in this tile.
pub trait WorkAllocator: Send + Sync {
    /// Returns the first unit for a slot.
    ///
    /// * `slot` - Slot index.
    fn first_work(&self, slot: usize) -> Option<WorkUnit>;

    /// Returns the unit following `current` for a slot.
    ///
    /// * `slot`    - Slot index.
    /// * `current` - The unit the slot just finished.
    fn next_work(&self, slot: usize, current: &WorkUnit) -> Option<WorkUnit>;

    /// Returns true once no slot can receive more work.
    fn is_exhausted(&self) -> bool;

    /// Returns the number of units in the tile.
    fn total_work(&self) -> u64;
}

/// Work allocation policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AllocationPolicy {
    /// Slots claim units from per partition counters and steal from other partitions once theirs runs dry.
    #[default]
    WorkStealing,

    /// Slot `i` renders every `parallel_samples`-th sample of a fixed pixel.
    Strided,
}

impl FromStr for AllocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stealing" | "work-stealing" => Ok(Self::WorkStealing),
            "strided" | "stride" => Ok(Self::Strided),
            _ => Err(format!("Unknown allocation policy '{s}'")),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkStealing => f.write_str("stealing"),
            Self::Strided => f.write_str("strided"),
        }
    }
}

/// Create the allocator for a tile.
///
/// * `config`         - Launch configuration of the tile.
/// * `policy`         - Allocation policy.
/// * `partition_size` - Partition width and height in pixels for work stealing.
pub fn create_work_allocator(
    config: &LaunchConfig,
    policy: AllocationPolicy,
    partition_size: (usize, usize),
) -> Result<Box<dyn WorkAllocator>, String> {
    match policy {
        AllocationPolicy::WorkStealing => Ok(Box::new(WorkStealingAllocator::new(config, partition_size)?)),
        AllocationPolicy::Strided => Ok(Box::new(StridedAllocator::new(config))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_from_str() {
        assert_eq!("stealing".parse::<AllocationPolicy>(), Ok(AllocationPolicy::WorkStealing));
        assert_eq!("strided".parse::<AllocationPolicy>(), Ok(AllocationPolicy::Strided));
        assert!("random".parse::<AllocationPolicy>().is_err());
        assert_eq!(AllocationPolicy::Strided.to_string(), "strided");
    }

    #[test]
    fn create_reports_bad_partition() {
        let config = LaunchConfig::for_tile(0, 0, 4, 4, 4, 1, 0, 2);
        assert!(create_work_allocator(&config, AllocationPolicy::WorkStealing, (0, 2)).is_err());
        let allocator = create_work_allocator(&config, AllocationPolicy::Strided, (0, 2)).unwrap();
        assert_eq!(allocator.total_work(), 32);
    }
}
