use std::ops::AddAssign;
use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate counters for one ring.
///
/// Updated with relaxed atomics only when the ring was created with
/// `enable_metrics`; the cursor protocol never reads them.
#[derive(Debug, Default)]
pub struct Metrics {
    elements_enqueued: AtomicU64,
    elements_dequeued: AtomicU64,
    enqueue_calls: AtomicU64,
    dequeue_calls: AtomicU64,
    enqueue_no_space: AtomicU64,
    dequeue_no_entries: AtomicU64,
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Elements moved into the ring.
    pub elements_enqueued: u64,
    /// Elements moved out of the ring.
    pub elements_dequeued: u64,
    /// Enqueue calls of any kind.
    pub enqueue_calls: u64,
    /// Dequeue calls of any kind.
    pub dequeue_calls: u64,
    /// Enqueue calls that moved nothing for lack of free slots.
    pub enqueue_no_space: u64,
    /// Dequeue calls that moved nothing for lack of entries.
    pub dequeue_no_entries: u64,
}

impl Metrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one enqueue call that asked for `requested` and moved `moved`.
    #[inline]
    pub(crate) fn record_enqueue(&self, requested: u32, moved: u32) {
        self.enqueue_calls.fetch_add(1, Ordering::Relaxed);
        if moved == 0 {
            if requested != 0 {
                self.enqueue_no_space.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.elements_enqueued
                .fetch_add(u64::from(moved), Ordering::Relaxed);
        }
    }

    /// Records one dequeue call that asked for `requested` and moved `moved`.
    #[inline]
    pub(crate) fn record_dequeue(&self, requested: u32, moved: u32) {
        self.dequeue_calls.fetch_add(1, Ordering::Relaxed);
        if moved == 0 {
            if requested != 0 {
                self.dequeue_no_entries.fetch_add(1, Ordering::Relaxed);
            }
        } else {
            self.elements_dequeued
                .fetch_add(u64::from(moved), Ordering::Relaxed);
        }
    }

    /// Takes a snapshot of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elements_enqueued: self.elements_enqueued.load(Ordering::Relaxed),
            elements_dequeued: self.elements_dequeued.load(Ordering::Relaxed),
            enqueue_calls: self.enqueue_calls.load(Ordering::Relaxed),
            dequeue_calls: self.dequeue_calls.load(Ordering::Relaxed),
            enqueue_no_space: self.enqueue_no_space.load(Ordering::Relaxed),
            dequeue_no_entries: self.dequeue_no_entries.load(Ordering::Relaxed),
        }
    }
}

impl AddAssign for MetricsSnapshot {
    fn add_assign(&mut self, rhs: Self) {
        self.elements_enqueued += rhs.elements_enqueued;
        self.elements_dequeued += rhs.elements_dequeued;
        self.enqueue_calls += rhs.enqueue_calls;
        self.dequeue_calls += rhs.dequeue_calls;
        self.enqueue_no_space += rhs.enqueue_no_space;
        self.dequeue_no_entries += rhs.dequeue_no_entries;
    }
}
