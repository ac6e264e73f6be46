//! Error types for ring creation and configuration.

use crate::{RingFlags, Side};
use thiserror::Error;

/// Errors surfaced synchronously when a ring is created or reconfigured.
///
/// A full ring on enqueue or an empty ring on dequeue is not an error: those
/// calls simply report zero elements transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// The requested element count cannot be turned into a ring size.
    #[error(
        "requested count {count} is invalid: must be non-zero, a power of two \
         unless exact size is requested, and fit in a ring of at most {max} slots"
    )]
    InvalidCount {
        /// The count that was requested.
        count: u32,
        /// Largest slot count a ring may have.
        max: u32,
    },

    /// The raw flag word carries bits that no flag is defined for.
    #[error("unsupported flag bits {bits:#x}")]
    UnsupportedFlags {
        /// The unknown bits.
        bits: u32,
    },

    /// More than one synchronization selector was given for one side.
    #[error("mutually exclusive {side} sync flags requested: {flags:?}")]
    ConflictingSyncFlags {
        /// The side whose selectors conflict.
        side: Side,
        /// The conflicting selectors.
        flags: RingFlags,
    },

    /// The slot array could not be allocated.
    #[error("cannot reserve {bytes} bytes for ring slots")]
    AllocationFailed {
        /// Size of the failed allocation.
        bytes: usize,
    },

    /// The head/tail distance bound only exists in relaxed tail sync mode.
    #[error("{side} side is not in relaxed tail sync mode")]
    NotRelaxedTailSync {
        /// The side that was addressed.
        side: Side,
    },
}

impl RingError {
    /// Returns `true` if the error stems from the requested configuration
    /// rather than from the environment.
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        !matches!(self, Self::AllocationFailed { .. })
    }
}
