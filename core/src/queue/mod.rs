//! Queues

use std::sync::atomic::{AtomicU32, Ordering};

/// Marks a queue entry that holds no slot.
pub const QUEUE_EMPTY_SLOT: u32 = u32::MAX;

/// Number of queues.
pub const NUM_QUEUES: usize = 2;

/// Names the queues that compact slots between stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Slots in `Active` or `Regenerated` state.
    ActiveAndRegenerated = 0,

    /// Slots in `HitBackground`, `UpdateBuffer` or `ToRegenerate` state.
    HitBackgroundUpdateBufferToRegenerate = 1,
}

impl QueueId {
    /// All queues.
    pub const ALL: [QueueId; NUM_QUEUES] = [
        Self::ActiveAndRegenerated,
        Self::HitBackgroundUpdateBufferToRegenerate,
    ];

    /// Returns the storage index of the queue.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Queue counts observed when a dispatch is launched.
pub type QueueSnapshot = [u32; NUM_QUEUES];

/// Fixed capacity index lists, one per `QueueId`.
///
/// Each queue is a global count plus an array of slot indices. Lanes reserve contiguous ranges with one atomic add per
/// workgroup and then write their entries; the count is reset by a single lane of the stage that empties the queue.
pub struct QueueManager {
    /// Entries per queue.
    capacity: usize,

    /// Global counts.
    counts: [AtomicU32; NUM_QUEUES],

    /// Entries of all queues, queue major.
    entries: Vec<AtomicU32>,
}

impl QueueManager {
    /// Create empty queues.
    ///
    /// * `capacity` - Entries per queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            counts: [AtomicU32::new(0), AtomicU32::new(0)],
            entries: (0..capacity * NUM_QUEUES)
                .map(|_| AtomicU32::new(QUEUE_EMPTY_SLOT))
                .collect(),
        }
    }

    /// Returns the number of entries per queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set the count of a queue to zero. Entries are left as they are.
    ///
    /// * `queue` - The queue.
    pub fn reset(&self, queue: QueueId) {
        self.counts[queue.index()].store(0, Ordering::Release);
    }

    /// Returns the current count of a queue.
    ///
    /// * `queue` - The queue.
    pub fn len(&self, queue: QueueId) -> usize {
        self.counts[queue.index()].load(Ordering::Acquire) as usize
    }

    /// Returns true if the queue has no entries.
    ///
    /// * `queue` - The queue.
    pub fn is_empty(&self, queue: QueueId) -> bool {
        self.len(queue) == 0
    }

    /// Returns the counts of all queues.
    pub fn snapshot(&self) -> QueueSnapshot {
        [
            self.counts[0].load(Ordering::Acquire),
            self.counts[1].load(Ordering::Acquire),
        ]
    }

    /// Map a linear thread index to a slot index.
    ///
    /// Returns `QUEUE_EMPTY_SLOT` when `thread_index` is past `count`. With `consume` the entry is replaced by
    /// `QUEUE_EMPTY_SLOT`.
    ///
    /// * `queue`        - The queue.
    /// * `thread_index` - Linear index of the lane in the dispatch.
    /// * `count`        - Count of the queue when the dispatch was launched.
    /// * `consume`      - Remove the entry from the queue.
    pub fn get_ray_index(&self, queue: QueueId, thread_index: usize, count: u32, consume: bool) -> u32 {
        if thread_index >= count as usize || thread_index >= self.capacity {
            return QUEUE_EMPTY_SLOT;
        }

        let entry = &self.entries[self.offset(queue, thread_index)];
        if consume {
            entry.swap(QUEUE_EMPTY_SLOT, Ordering::AcqRel)
        } else {
            entry.load(Ordering::Acquire)
        }
    }

    /// Reserve a contiguous range of `n` entries and return its first position.
    ///
    /// * `queue` - The queue.
    /// * `n`     - Number of entries.
    pub fn reserve(&self, queue: QueueId, n: u32) -> u32 {
        let base = self.counts[queue.index()].fetch_add(n, Ordering::AcqRel);
        assert!(
            base as usize + n as usize <= self.capacity,
            "Queue {queue:?} overflow: {} entries for capacity {}",
            base as usize + n as usize,
            self.capacity
        );
        base
    }

    /// Write a slot index at a reserved position.
    ///
    /// * `queue`    - The queue.
    /// * `position` - Position returned by `reserve()` plus the lane's offset.
    /// * `slot`     - Slot index.
    pub fn write(&self, queue: QueueId, position: u32, slot: u32) {
        self.entries[self.offset(queue, position as usize)].store(slot, Ordering::Release);
    }

    /// Append one slot index.
    ///
    /// * `queue` - The queue.
    /// * `slot`  - Slot index.
    pub fn push(&self, queue: QueueId, slot: u32) {
        let position = self.reserve(queue, 1);
        self.write(queue, position, slot);
    }

    /// Empty all queues.
    pub fn clear(&mut self) {
        for count in self.counts.iter_mut() {
            *count.get_mut() = 0;
        }
        for entry in self.entries.iter_mut() {
            *entry.get_mut() = QUEUE_EMPTY_SLOT;
        }
    }

    /// Returns the first `len()` entries of a queue.
    ///
    /// * `queue` - The queue.
    pub fn entries(&self, queue: QueueId) -> Vec<u32> {
        let start = self.offset(queue, 0);
        let len = self.len(queue).min(self.capacity);
        self.entries[start..start + len]
            .iter()
            .map(|e| e.load(Ordering::Acquire))
            .collect()
    }

    fn offset(&self, queue: QueueId, position: usize) -> usize {
        queue.index() * self.capacity + position
    }
}
