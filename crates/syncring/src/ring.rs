use crate::elems::{read_slots, write_slots};
use crate::headtail::{Behavior, Claim, HeadTail};
use crate::invariants::{debug_assert_all_or_nothing, debug_assert_bounded_count};
use crate::{Backoff, Config, Geometry, Metrics, MetricsSnapshot, RingError, RingFlags, Side, SyncMode};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::{self, MaybeUninit};

// =============================================================================
// LAYOUT
// =============================================================================
//
// The header (geometry, flags) is read-only after creation. The producer and
// consumer cursor groups each sit on their own cache line pair so producers
// hammering their head do not invalidate the line consumers spin on, and vice
// versa. Slots live in one boxed array of `size` elements allocated at
// creation; nothing is allocated afterwards.
//
// The ring performs no lifetime tracking: it is dropped once every producer
// and consumer is done with it, which `Arc<Ring<T>>` or scoped threads
// express directly.
//
// =============================================================================

/// Default RTS head/tail distance is `capacity / HTD_MAX_DIVISOR`.
const HTD_MAX_DIVISOR: u32 = 8;

const CACHE_LINE: usize = 64;

/// Result of a bulk or burst call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transfer {
    /// Elements actually moved.
    pub count: usize,
    /// Free slots (enqueue) or available entries (dequeue) left behind, as
    /// seen by this call.
    pub remaining: usize,
}

impl Transfer {
    #[inline]
    fn from_claim(claim: &Claim) -> Self {
        Self {
            count: claim.n as usize,
            remaining: claim.entries.wrapping_sub(claim.n) as usize,
        }
    }

    /// Returns true if nothing was moved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Bounded multi-mode ring of fixed-size elements.
///
/// Each side (producer, consumer) runs one synchronization discipline picked
/// by the creation flags:
/// - single-thread: no atomic read-modify-write on that side; exactly one
///   thread at a time may call that side's operations
/// - CAS (default): any number of threads, head advanced by compare-and-swap
/// - HTS: any number of threads, at most one reservation in flight
/// - RTS: any number of threads, head may lead tail by a bounded distance
///
/// Elements are copied in and out; typical payloads are indices or addresses
/// of work items owned elsewhere.
#[repr(C)]
pub struct Ring<T> {
    // === HEADER === (immutable after creation)
    geometry: Geometry,
    flags: RingFlags,
    enable_metrics: bool,

    // === PRODUCER === (cache-line padded)
    prod: CachePadded<HeadTail>,

    // === CONSUMER === (cache-line padded)
    cons: CachePadded<HeadTail>,

    // === COLD STATE ===
    metrics: CachePadded<Metrics>,

    // === SLOTS ===
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
}

// Safety: slot access is mediated by the cursor protocol; a slot is written
// only inside a producer reservation and read only inside a consumer
// reservation, and reservations never overlap.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T: Copy> Ring<T> {
    /// Element size is fixed by `T`; zero-sized elements cannot be stored.
    const ELEMENT_SIZE_OK: () = assert!(
        mem::size_of::<T>() != 0,
        "ring elements must have a non-zero size"
    );

    /// Creates a new ring with the given configuration.
    ///
    /// Fails when the flags are unknown or select two disciplines for one
    /// side, when the count is invalid for the sizing mode, or when the slot
    /// array cannot be allocated.
    pub fn new(config: Config) -> Result<Self, RingError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::ELEMENT_SIZE_OK;

        Self::build(config).inspect_err(|err| {
            log::warn!(
                "cannot create ring (count {}, flags {:#x}): {}",
                config.count,
                config.flags.bits(),
                err
            );
        })
    }

    /// Creates a ring for `count` elements with the given flags.
    ///
    /// `count` must be a power of two unless [`RingFlags::EXACT_SIZE`] is set.
    pub fn create(count: u32, flags: RingFlags) -> Result<Self, RingError> {
        Self::new(Config::new(count, flags, false))
    }

    /// Creates a ring that can hold at least `count` elements, whatever
    /// `count` is, by rounding the slot array up.
    pub fn with_room_for(count: u32, flags: RingFlags) -> Result<Self, RingError> {
        let config = Config::for_requested(count, flags).inspect_err(|err| {
            log::warn!("cannot create ring with room for {} elements: {}", count, err);
        })?;
        Self::new(config)
    }

    fn build(config: Config) -> Result<Self, RingError> {
        let flags = RingFlags::from_raw(config.flags.bits())?;
        let (producer, consumer) = flags.sync_modes()?;
        let geometry = config.geometry()?;
        let slots = allocate_slots::<T>(geometry.size)?;
        let htd_max = geometry.capacity / HTD_MAX_DIVISOR;

        log::debug!(
            "created ring: size {}, capacity {}, producer {}, consumer {}",
            geometry.size,
            geometry.capacity,
            producer,
            consumer
        );

        Ok(Self {
            geometry,
            flags,
            enable_metrics: config.enable_metrics,
            prod: CachePadded::new(HeadTail::new(producer, htd_max)),
            cons: CachePadded::new(HeadTail::new(consumer, htd_max)),
            metrics: CachePadded::new(Metrics::new()),
            slots,
        })
    }

    /// Bytes occupied by a ring of `count` slots: header plus slot array,
    /// rounded up to a cache line.
    ///
    /// `count` must be a non-zero power of two within the size limit.
    pub fn memsize(count: u32) -> Result<usize, RingError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::ELEMENT_SIZE_OK;

        let geometry = Config::new(count, RingFlags::empty(), false).geometry()?;
        let bytes = mem::size_of::<Self>() + geometry.size as usize * mem::size_of::<T>();
        Ok(bytes.next_multiple_of(CACHE_LINE))
    }

    #[inline]
    fn slots_ptr(&self) -> *mut T {
        UnsafeCell::raw_get(self.slots.as_ptr()).cast::<T>()
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    fn do_enqueue(&self, items: &[T], behavior: Behavior) -> Transfer {
        let requested = request_len(items.len());
        let claim = self
            .prod
            .move_head(&self.cons, self.geometry.capacity, requested, behavior);

        if claim.n != 0 {
            debug_assert_bounded_count!(claim.entries, self.geometry.capacity);

            // SAFETY: [old_head, new_head) is reserved for this call alone
            // until update_tail, and the consumer tail we loaded with Acquire
            // shows those slots are free.
            unsafe {
                write_slots(
                    self.slots_ptr(),
                    self.geometry.mask,
                    claim.old_head,
                    &items[..claim.n as usize],
                );
            }
            self.prod.update_tail(&claim);
        }

        if self.enable_metrics {
            self.metrics.record_enqueue(requested, claim.n);
        }

        Transfer::from_claim(&claim)
    }

    /// Enqueues one element. Returns `false` if the ring is full.
    #[inline]
    pub fn enqueue(&self, item: T) -> bool {
        !self.do_enqueue(&[item], Behavior::Fixed).is_empty()
    }

    /// Enqueues all of `items` or none of them.
    #[inline]
    pub fn enqueue_bulk(&self, items: &[T]) -> Transfer {
        let transfer = self.do_enqueue(items, Behavior::Fixed);
        debug_assert_all_or_nothing!(transfer.count, items.len());
        transfer
    }

    /// Enqueues as many of `items` as fit, in order.
    #[inline]
    pub fn enqueue_burst(&self, items: &[T]) -> Transfer {
        self.do_enqueue(items, Behavior::Variable)
    }

    /// Enqueue with adaptive backoff. Spins, yields, then gives up.
    pub fn enqueue_with_backoff(&self, item: T) -> bool {
        let mut backoff = Backoff::new();
        loop {
            if self.enqueue(item) {
                return true;
            }
            if backoff.is_completed() {
                return false;
            }
            backoff.snooze();
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    fn do_dequeue(&self, out: &mut [MaybeUninit<T>], behavior: Behavior) -> Transfer {
        let requested = request_len(out.len());
        let claim = self.cons.move_head(&self.prod, 0, requested, behavior);

        if claim.n != 0 {
            debug_assert_bounded_count!(claim.entries, self.geometry.capacity);

            // SAFETY: [old_head, new_head) is reserved for this call alone
            // and was published by the producer side, whose tail we loaded
            // with Acquire.
            unsafe {
                read_slots(
                    self.slots_ptr(),
                    self.geometry.mask,
                    claim.old_head,
                    &mut out[..claim.n as usize],
                );
            }
            self.cons.update_tail(&claim);
        }

        if self.enable_metrics {
            self.metrics.record_dequeue(requested, claim.n);
        }

        Transfer::from_claim(&claim)
    }

    /// Dequeues one element. Returns `None` if the ring is empty.
    #[inline]
    pub fn dequeue(&self) -> Option<T> {
        let mut out = [MaybeUninit::uninit()];
        if self.do_dequeue(&mut out, Behavior::Fixed).is_empty() {
            return None;
        }
        let [item] = out;
        // SAFETY: a non-empty transfer initialized the slot.
        Some(unsafe { item.assume_init() })
    }

    /// Fills all of `out` or dequeues nothing.
    #[inline]
    pub fn dequeue_bulk(&self, out: &mut [T]) -> Transfer {
        let requested = out.len();
        let transfer = self.do_dequeue(as_uninit_mut(out), Behavior::Fixed);
        debug_assert_all_or_nothing!(transfer.count, requested);
        transfer
    }

    /// Dequeues as many elements as are available, up to `out.len()`, into
    /// the front of `out`.
    #[inline]
    pub fn dequeue_burst(&self, out: &mut [T]) -> Transfer {
        self.do_dequeue(as_uninit_mut(out), Behavior::Variable)
    }

    /// Dequeue with adaptive backoff. Spins, yields, then gives up.
    pub fn dequeue_with_backoff(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        loop {
            if let Some(item) = self.dequeue() {
                return Some(item);
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }
}

impl<T> Ring<T> {
    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Returns the number of slots (a power of two).
    #[inline]
    pub fn size(&self) -> usize {
        self.geometry.size as usize
    }

    /// Returns the number of usable slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.geometry.capacity as usize
    }

    /// Returns the flags the ring was created with.
    #[inline]
    pub fn flags(&self) -> RingFlags {
        self.flags
    }

    /// Returns the producer side discipline.
    #[inline]
    pub fn producer_sync(&self) -> SyncMode {
        self.prod.sync_mode()
    }

    /// Returns the consumer side discipline.
    #[inline]
    pub fn consumer_sync(&self) -> SyncMode {
        self.cons.sync_mode()
    }

    /// Returns the number of published entries.
    ///
    /// Only a snapshot while other threads are active.
    #[inline]
    pub fn count(&self) -> usize {
        let prod_tail = self.prod.tail();
        let cons_tail = self.cons.tail();
        let count = prod_tail.wrapping_sub(cons_tail) & self.geometry.mask;
        count.min(self.geometry.capacity) as usize
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.count()
    }

    /// Returns true if the ring is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_count() == 0
    }

    /// Returns true if the ring is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prod.tail() == self.cons.tail()
    }

    // ---------------------------------------------------------------------
    // RELAXED TAIL SYNC
    // ---------------------------------------------------------------------

    /// Maximum producer head/tail distance, if the producer side is RTS.
    pub fn producer_htd_max(&self) -> Option<u32> {
        self.prod.htd_max()
    }

    /// Maximum consumer head/tail distance, if the consumer side is RTS.
    pub fn consumer_htd_max(&self) -> Option<u32> {
        self.cons.htd_max()
    }

    /// Sets the maximum producer head/tail distance.
    pub fn set_producer_htd_max(&self, max: u32) -> Result<(), RingError> {
        self.set_htd_max(Side::Producer, max)
    }

    /// Sets the maximum consumer head/tail distance.
    pub fn set_consumer_htd_max(&self, max: u32) -> Result<(), RingError> {
        self.set_htd_max(Side::Consumer, max)
    }

    fn set_htd_max(&self, side: Side, max: u32) -> Result<(), RingError> {
        let cursors = match side {
            Side::Producer => &self.prod,
            Side::Consumer => &self.cons,
        };
        if !cursors.set_htd_max(max) {
            return Err(RingError::NotRelaxedTailSync { side });
        }
        log::debug!("{} head/tail distance set to {}", side, max);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // METRICS
    // ---------------------------------------------------------------------

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    /// Moves every cursor to `pos`. Only valid on an idle, empty ring.
    #[cfg(test)]
    pub(crate) fn reset_cursors(&self, pos: u32) {
        self.prod.reset_to(pos);
        self.cons.reset_to(pos);
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("size", &self.geometry.size)
            .field("capacity", &self.geometry.capacity)
            .field("flags", &self.flags)
            .field("producer", &self.prod.sync_mode())
            .field("consumer", &self.cons.sync_mode())
            .field("prod_head", &self.prod.head())
            .field("prod_tail", &self.prod.tail())
            .field("cons_head", &self.cons.head())
            .field("cons_tail", &self.cons.tail())
            .finish()
    }
}

// ---------------------------------------------------------------------
// HELPERS
// ---------------------------------------------------------------------

fn allocate_slots<T>(size: u32) -> Result<Box<[UnsafeCell<MaybeUninit<T>>]>, RingError> {
    let size = size as usize;
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(size)
        .map_err(|_| RingError::AllocationFailed {
            bytes: size.saturating_mul(mem::size_of::<T>()),
        })?;
    slots.resize_with(size, || UnsafeCell::new(MaybeUninit::uninit()));
    Ok(slots.into_boxed_slice())
}

/// Requests beyond u32::MAX can never be satisfied in full anyway.
#[inline]
fn request_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[inline]
fn as_uninit_mut<T>(out: &mut [T]) -> &mut [MaybeUninit<T>] {
    // SAFETY: MaybeUninit<T> has the layout of T, and only initialized values
    // are ever written through the returned slice.
    unsafe { &mut *(out as *mut [T] as *mut [MaybeUninit<T>]) }
}
