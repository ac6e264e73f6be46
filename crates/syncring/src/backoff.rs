use std::hint;
use std::thread;

/// Adaptive backoff for callers that retry a full or empty ring.
///
/// Spins with PAUSE hints in doubling rounds, then yields to the OS, then
/// reports that patience is exhausted. The ring's own cursor waits never use
/// this; it exists for retry policies layered on top, such as
/// [`Ring::enqueue_with_backoff`](crate::Ring::enqueue_with_backoff).
#[derive(Debug, Clone)]
pub struct Backoff {
    step: u32,
    spin_limit: u32,
    yield_limit: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10; // Then give up

    /// Creates a backoff with the default limits.
    #[inline]
    pub fn new() -> Self {
        Self::with_limits(Self::SPIN_LIMIT, Self::YIELD_LIMIT)
    }

    /// Creates a backoff that spins for `spin_limit` rounds and gives up after
    /// `yield_limit` rounds in total.
    #[inline]
    pub fn with_limits(spin_limit: u32, yield_limit: u32) -> Self {
        Self {
            step: 0,
            spin_limit,
            yield_limit: yield_limit.max(spin_limit),
        }
    }

    /// Waits a little longer than last time.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= self.spin_limit {
            for _ in 0..1u32 << self.step.min(31) {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }
        if self.step <= self.yield_limit {
            self.step += 1;
        }
    }

    /// Check if we've exhausted patience.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > self.yield_limit
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
