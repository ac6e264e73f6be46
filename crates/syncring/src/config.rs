use crate::{RingError, RingFlags};

/// Largest slot count a ring may have; the top bit of a size is reserved.
pub const SIZE_MASK: u32 = 0x7fff_ffff;

/// Configuration for a [`Ring`](crate::Ring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested element count.
    ///
    /// Must be a power of two unless [`RingFlags::EXACT_SIZE`] is set.
    pub count: u32,
    /// Synchronization selectors and sizing semantics.
    pub flags: RingFlags,
    /// Enable aggregate counters (slight overhead on every call)
    pub enable_metrics: bool,
}

/// Shape of a ring, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of slots, always a power of two.
    pub size: u32,
    /// `size - 1`; maps a cursor to a slot index.
    pub mask: u32,
    /// Usable slots.
    pub capacity: u32,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(count: u32, flags: RingFlags, enable_metrics: bool) -> Self {
        Self {
            count,
            flags,
            enable_metrics,
        }
    }

    /// Configuration guaranteeing room for at least `count` elements.
    ///
    /// The slot count becomes the next power of two strictly greater than
    /// `count`, so the usable capacity is that power of two minus one. Fails
    /// with the caller's `count` when it is zero or that slot count would
    /// exceed [`SIZE_MASK`].
    pub fn for_requested(count: u32, flags: RingFlags) -> Result<Self, RingError> {
        let size = count
            .checked_add(1)
            .and_then(u32::checked_next_power_of_two)
            .filter(|&size| count != 0 && size <= SIZE_MASK)
            .ok_or(RingError::InvalidCount {
                count,
                max: SIZE_MASK,
            })?;
        Ok(Self::new(
            size,
            flags.difference(RingFlags::EXACT_SIZE),
            false,
        ))
    }

    /// Sets the synchronization and sizing flags.
    pub fn with_flags(mut self, flags: RingFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Enables or disables aggregate counters.
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Computes the ring shape for this configuration.
    pub fn geometry(&self) -> Result<Geometry, RingError> {
        let invalid = RingError::InvalidCount {
            count: self.count,
            max: SIZE_MASK,
        };

        if self.count == 0 {
            return Err(invalid);
        }

        if self.flags.contains(RingFlags::EXACT_SIZE) {
            let size = self
                .count
                .checked_add(1)
                .and_then(u32::checked_next_power_of_two)
                .filter(|&size| size <= SIZE_MASK)
                .ok_or(invalid)?;
            Ok(Geometry {
                size,
                mask: size - 1,
                capacity: self.count,
            })
        } else {
            if !self.count.is_power_of_two() || self.count > SIZE_MASK {
                return Err(invalid);
            }
            Ok(Geometry {
                size: self.count,
                mask: self.count - 1,
                capacity: self.count - 1,
            })
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            count: 1 << 16, // 64K slots
            flags: RingFlags::empty(),
            enable_metrics: false,
        }
    }
}

/// Single producer, single consumer, 4K slots.
pub const SPSC_CONFIG: Config = Config::new(1 << 12, RingFlags::SPSC, false);

/// Many CAS producers draining into one consumer, 4M slots (per-worker inbox).
pub const MPSC_CONFIG: Config = Config::new(1 << 22, RingFlags::MPSC, false);

/// Head/tail sync on both sides, 64K slots.
pub const HTS_CONFIG: Config = Config::new(
    1 << 16,
    RingFlags::MULTI_PRODUCER_HTS.union(RingFlags::MULTI_CONSUMER_HTS),
    false,
);
