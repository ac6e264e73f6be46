//! Debug assertion macros for the cursor invariants.
//!
//! These are only active in debug builds (`#[cfg(debug_assertions)]`), so
//! there is zero overhead in release builds.
//!
//! All cursor differences are taken modulo 2^32; comparing raw cursor values
//! with `<`/`>` is meaningless once a cursor wraps.

// =============================================================================
// Bounded occupancy
// =============================================================================

/// Assert that a successful claim saw no more than `capacity` entries.
///
/// **Invariant**: `0 ≤ (prod.tail - cons.head) mod 2^32 ≤ capacity`, and
/// symmetrically for free slots on the producer side.
///
/// Used in: `Ring` enqueue/dequeue paths after a non-empty head move
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

// =============================================================================
// Claims
// =============================================================================

/// Assert that a head move never claims more than was free/available.
///
/// **Invariant**: `n ≤ entries` and `n ≤ requested`
///
/// Used in: every `move_head` variant before the head is advanced
macro_rules! debug_assert_claim_within {
    ($n:expr, $entries:expr, $requested:expr) => {
        debug_assert!(
            $n <= $entries && $n <= $requested,
            "claim of {} exceeds entries {} or request {}",
            $n,
            $entries,
            $requested
        )
    };
}

/// Assert that a fixed-count claim transferred all or nothing.
///
/// Used in: `Ring` bulk operations after the head move
macro_rules! debug_assert_all_or_nothing {
    ($n:expr, $requested:expr) => {
        debug_assert!(
            $n == 0 || $n == $requested,
            "fixed claim moved {} of {} elements",
            $n,
            $requested
        )
    };
}

// =============================================================================
// Single-thread ownership
// =============================================================================

/// Assert that nobody else moved a single-thread head behind our back.
///
/// A second thread driving a single-thread side is a caller bug; in debug
/// builds it usually shows up as the head changing between load and store.
///
/// Used in: `Cursor::move_head` in single-thread mode
macro_rules! debug_assert_sole_owner {
    ($observed:expr, $expected:expr) => {
        debug_assert_eq!(
            $observed, $expected,
            "single-thread head moved concurrently: another thread is using this side"
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_all_or_nothing;
pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_claim_within;
pub(crate) use debug_assert_sole_owner;
