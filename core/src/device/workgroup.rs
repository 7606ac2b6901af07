//! Workgroup

use super::EarlyExit;
use crate::queue::*;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

/// Workgroup local counters used by the two-phase enqueue. They live for one enqueue.
#[derive(Debug, Default)]
pub struct LocalQueueAtomics {
    /// Number of lanes of the workgroup that enqueue.
    count: AtomicU32,

    /// Start of the range reserved in the global queue.
    base: AtomicU32,
}

impl LocalQueueAtomics {
    /// Zero the counters. Done by one lane before the first barrier.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.base.store(0, Ordering::Relaxed);
    }
}

/// A batch of lanes executing a kernel in lock-step.
///
/// Kernels loop over `lanes()` once per phase. The end of such a loop is a barrier: every lane finishes a phase
/// before any lane starts the next one.
pub struct Workgroup {
    /// Index of the workgroup in the dispatch.
    group_id: usize,

    /// Lanes per workgroup.
    local_size: usize,

    /// Number of lanes of the dispatch that map to slots.
    global_size: usize,

    /// Lanes dequeue slots from queues.
    use_queues: bool,

    /// What lanes without a slot do.
    early_exit: EarlyExit,

    /// Queue counts when the dispatch was launched.
    snapshot: QueueSnapshot,

    /// Lanes that left the workgroup.
    exited: Vec<bool>,

    /// Lanes that found no slot.
    idle: usize,

    /// Scratch for the two-phase enqueue.
    local_queue_atomics: LocalQueueAtomics,
}

impl Workgroup {
    /// Create a workgroup.
    ///
    /// * `group_id`    - Index of the workgroup in the dispatch.
    /// * `local_size`  - Lanes per workgroup.
    /// * `global_size` - Number of lanes of the dispatch that map to slots.
    /// * `use_queues`  - Lanes dequeue slots from queues.
    /// * `early_exit`  - What lanes without a slot do.
    /// * `snapshot`    - Queue counts when the dispatch was launched.
    pub fn new(
        group_id: usize,
        local_size: usize,
        global_size: usize,
        use_queues: bool,
        early_exit: EarlyExit,
        snapshot: QueueSnapshot,
    ) -> Self {
        Self {
            group_id,
            local_size,
            global_size,
            use_queues,
            early_exit,
            snapshot,
            exited: vec![false; local_size],
            idle: 0,
            local_queue_atomics: LocalQueueAtomics::default(),
        }
    }

    /// Returns the number of lanes.
    pub fn local_size(&self) -> usize {
        self.local_size
    }

    /// Returns the local ids of the lanes.
    pub fn lanes(&self) -> Range<usize> {
        0..self.local_size
    }

    /// Returns the linear id of a lane in the dispatch.
    ///
    /// * `lane` - Local id.
    pub fn global_id(&self, lane: usize) -> usize {
        self.group_id * self.local_size + lane
    }

    /// Returns true if lanes dequeue slots from queues.
    pub fn use_queues(&self) -> bool {
        self.use_queues
    }

    /// Returns the number of lanes that found no slot.
    pub fn idle_lanes(&self) -> usize {
        self.idle
    }

    /// Returns the slot a lane maps to when the dispatch visits every slot.
    ///
    /// * `lane` - Local id.
    pub fn dense_ray_index(&self, lane: usize) -> Option<usize> {
        let thread_index = self.global_id(lane);
        (thread_index < self.global_size).then_some(thread_index)
    }

    /// Returns the slot a lane processes, dequeuing it from `queue` in compacted mode.
    ///
    /// * `queues`  - The queues.
    /// * `lane`    - Local id.
    /// * `queue`   - Queue to dequeue from.
    /// * `consume` - Remove the entry from the queue.
    pub fn ray_index(&self, queues: &QueueManager, lane: usize, queue: QueueId, consume: bool) -> Option<usize> {
        if !self.use_queues {
            return self.dense_ray_index(lane);
        }

        let thread_index = self.global_id(lane);
        let count = self.snapshot[queue.index()];
        match queues.get_ray_index(queue, thread_index, count, consume) {
            QUEUE_EMPTY_SLOT => None,
            ray_index => Some(ray_index as usize),
        }
    }

    /// A lane found no slot to process.
    ///
    /// * `lane` - Local id.
    pub fn exit(&mut self, lane: usize) {
        self.idle += 1;
        if self.early_exit == EarlyExit::Return {
            self.exited[lane] = true;
        }
    }

    /// Returns true if a lane left the workgroup.
    ///
    /// * `lane` - Local id.
    pub fn has_exited(&self, lane: usize) -> bool {
        self.exited[lane]
    }

    /// Two-phase enqueue of the slots in `flags` into `queue`. `flags[lane]` holds the slot a lane enqueues.
    ///
    /// Lanes take offsets from a workgroup local counter; after a barrier one lane reserves the workgroup's range
    /// with a single atomic add on the queue; after a second barrier every flagged lane writes its slot.
    ///
    /// * `queues` - The queues.
    /// * `queue`  - Target queue.
    /// * `flags`  - Slot to enqueue for each lane.
    pub fn enqueue_ray_index_local(&mut self, queues: &QueueManager, queue: QueueId, flags: &[Option<usize>]) {
        assert_eq!(flags.len(), self.local_size, "Enqueue flags do not cover the workgroup");

        let local = &self.local_queue_atomics;
        local.reset();

        let mut offsets = vec![0_u32; self.local_size];
        for lane in self.lanes() {
            if self.exited[lane] {
                assert!(flags[lane].is_none(), "Lane {lane} left the workgroup but enqueues a slot");
                continue;
            }
            if flags[lane].is_some() {
                offsets[lane] = local.count.fetch_add(1, Ordering::Relaxed);
            }
        }
        // barrier

        let leader = self.lanes().find(|&lane| !self.exited[lane]);
        if leader.is_some() {
            let n = local.count.load(Ordering::Relaxed);
            if n > 0 {
                local.base.store(queues.reserve(queue, n), Ordering::Relaxed);
            }
        }
        // barrier

        let base = local.base.load(Ordering::Relaxed);
        for lane in self.lanes() {
            if let Some(slot) = flags[lane] {
                queues.write(queue, base + offsets[lane], slot as u32);
            }
        }
    }
}
