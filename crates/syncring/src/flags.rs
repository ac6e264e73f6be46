//! Creation flags and the per-side synchronization disciplines they select.

use crate::RingError;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags supplied when a ring is created.
    ///
    /// With no sync flag for a side, that side is multi-thread safe using a
    /// compare-and-swap on its head cursor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RingFlags: u32 {
        /// Enqueue is driven by a single producer thread.
        const SINGLE_PRODUCER = 0x0001;
        /// Dequeue is driven by a single consumer thread.
        const SINGLE_CONSUMER = 0x0002;
        /// Usable capacity is exactly the requested count.
        ///
        /// The slot array is rounded up to the next power of two strictly
        /// greater than the count, so a power-of-two request wastes half of it.
        const EXACT_SIZE = 0x0004;
        /// Multi-producer relaxed tail sync.
        const MULTI_PRODUCER_RTS = 0x0008;
        /// Multi-consumer relaxed tail sync.
        const MULTI_CONSUMER_RTS = 0x0010;
        /// Multi-producer head/tail sync.
        const MULTI_PRODUCER_HTS = 0x0020;
        /// Multi-consumer head/tail sync.
        const MULTI_CONSUMER_HTS = 0x0040;
    }
}

impl RingFlags {
    /// Single producer and single consumer.
    pub const SPSC: Self = Self::SINGLE_PRODUCER.union(Self::SINGLE_CONSUMER);

    /// Multi-producer (CAS) and single consumer.
    pub const MPSC: Self = Self::SINGLE_CONSUMER;

    const PRODUCER_SYNC: Self = Self::SINGLE_PRODUCER
        .union(Self::MULTI_PRODUCER_RTS)
        .union(Self::MULTI_PRODUCER_HTS);

    const CONSUMER_SYNC: Self = Self::SINGLE_CONSUMER
        .union(Self::MULTI_CONSUMER_RTS)
        .union(Self::MULTI_CONSUMER_HTS);

    /// Parses a raw flag word, rejecting bits this ring does not understand.
    pub fn from_raw(bits: u32) -> Result<Self, RingError> {
        Self::from_bits(bits).ok_or(RingError::UnsupportedFlags {
            bits: bits & !Self::all().bits(),
        })
    }

    /// Resolves the producer and consumer disciplines selected by these flags.
    ///
    /// At most one sync selector per side is allowed.
    pub fn sync_modes(self) -> Result<(SyncMode, SyncMode), RingError> {
        let producer = Self::side_mode(
            Side::Producer,
            self & Self::PRODUCER_SYNC,
            [
                (Self::SINGLE_PRODUCER, SyncMode::Single),
                (Self::MULTI_PRODUCER_RTS, SyncMode::Rts),
                (Self::MULTI_PRODUCER_HTS, SyncMode::Hts),
            ],
        )?;
        let consumer = Self::side_mode(
            Side::Consumer,
            self & Self::CONSUMER_SYNC,
            [
                (Self::SINGLE_CONSUMER, SyncMode::Single),
                (Self::MULTI_CONSUMER_RTS, SyncMode::Rts),
                (Self::MULTI_CONSUMER_HTS, SyncMode::Hts),
            ],
        )?;
        Ok((producer, consumer))
    }

    fn side_mode(
        side: Side,
        selected: Self,
        selectors: [(Self, SyncMode); 3],
    ) -> Result<SyncMode, RingError> {
        if selected.is_empty() {
            return Ok(SyncMode::Multi);
        }
        selectors
            .into_iter()
            .find_map(|(flag, mode)| (selected == flag).then_some(mode))
            .ok_or(RingError::ConflictingSyncFlags {
                side,
                flags: selected,
            })
    }
}

/// Synchronization discipline of one side of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncMode {
    /// Single thread only; head is advanced with a plain store.
    Single,
    /// Multi-thread safe; head is advanced by compare-and-swap and tails are
    /// published in reservation order.
    #[default]
    Multi,
    /// Multi-thread head/tail sync; head and tail move together in one 64-bit
    /// word so only one reservation is ever in flight.
    Hts,
    /// Multi-thread relaxed tail sync; head may run ahead of tail by at most
    /// a configurable distance.
    Rts,
}

impl SyncMode {
    /// Returns true for the disciplines that tolerate concurrent callers.
    #[inline]
    pub fn is_multi_thread(self) -> bool {
        !matches!(self, Self::Single)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single-thread",
            Self::Multi => "multi-thread",
            Self::Hts => "multi-thread head/tail sync",
            Self::Rts => "multi-thread relaxed tail sync",
        };
        f.write_str(name)
    }
}

/// One of the two cursor groups of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The enqueue side.
    Producer,
    /// The dequeue side.
    Consumer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer => f.write_str("producer"),
            Self::Consumer => f.write_str("consumer"),
        }
    }
}
