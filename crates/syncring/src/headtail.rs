use crate::invariants::{debug_assert_claim_within, debug_assert_sole_owner};
use crate::sync::{fence, spin_loop, AtomicU32, AtomicU64, Ordering};
use crate::SyncMode;

// =============================================================================
// CURSOR PROTOCOL
// =============================================================================
//
// Each side of the ring owns a head and a tail cursor. Cursors are u32 values
// that only ever grow and wrap modulo 2^32; the slot index is `cursor & mask`.
// Every distance between two cursors is a wrapping subtraction, which stays in
// [0, capacity] because no side may run more than `capacity` ahead of the
// other.
//
// An operation on one side is always:
//
// 1. move_head:   reserve n slots by advancing this side's head. The opposite
//                 side's tail is loaded with Acquire so the slots it published
//                 (written elements, or freed slots) are visible.
// 2. copy:        move elements between the caller and the reserved slots.
// 3. update_tail: publish the reservation by advancing this side's tail with
//                 Release, making the copy visible to the opposite side.
//
// Disciplines:
//
// - Single: head is advanced with a plain store. Only one thread may drive
//   the side.
// - Multi:  head is advanced by CAS. A reservation may finish its copy before
//   an earlier one, so update_tail waits until tail reaches its own starting
//   head: tails are published in the order heads were reserved.
// - Hts:    head and tail live in one u64. A new reservation waits until
//   head == tail, so at most one reservation is in flight and publishing never
//   waits.
// - Rts:    head and tail are {pos, cnt} pairs. Reservations may overlap; the
//   last one to finish moves the tail up to the head. Head may not run more
//   than `htd_max` ahead of tail.
//
// =============================================================================

/// How many elements a head move may settle for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Exactly the requested count or nothing.
    Fixed,
    /// As many as are available, up to the requested count.
    Variable,
}

impl Behavior {
    #[inline]
    fn clamp(self, requested: u32, entries: u32) -> u32 {
        if requested <= entries {
            requested
        } else {
            match self {
                Self::Fixed => 0,
                Self::Variable => entries,
            }
        }
    }
}

/// Outcome of a head move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Claim {
    /// Head before the move; first reserved cursor.
    pub old_head: u32,
    /// Head after the move.
    pub new_head: u32,
    /// Number of reserved slots (zero when nothing was reserved).
    pub n: u32,
    /// Free slots (producer) or available entries (consumer) seen by the move.
    pub entries: u32,
}

impl Claim {
    #[inline]
    fn none(head: u32, entries: u32) -> Self {
        Self {
            old_head: head,
            new_head: head,
            n: 0,
            entries,
        }
    }

    #[inline]
    fn new(old_head: u32, n: u32, entries: u32) -> Self {
        Self {
            old_head,
            new_head: old_head.wrapping_add(n),
            n,
            entries,
        }
    }
}

/// Head/tail pair for the single-thread and CAS disciplines.
pub(crate) struct Cursor {
    head: AtomicU32,
    tail: AtomicU32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
        }
    }

    fn move_head(
        &self,
        single: bool,
        opposite: &HeadTail,
        capacity: u32,
        requested: u32,
        behavior: Behavior,
    ) -> Claim {
        let mut old_head = self.head.load(Ordering::Relaxed);
        loop {
            // Head must be read before the opposite tail
            fence(Ordering::Acquire);

            let entries = capacity
                .wrapping_add(opposite.tail())
                .wrapping_sub(old_head);
            let n = behavior.clamp(requested, entries);
            if n == 0 {
                return Claim::none(old_head, entries);
            }
            debug_assert_claim_within!(n, entries, requested);

            let claim = Claim::new(old_head, n, entries);
            if single {
                debug_assert_sole_owner!(self.head.load(Ordering::Relaxed), old_head);
                self.head.store(claim.new_head, Ordering::Relaxed);
                return claim;
            }

            match self.head.compare_exchange_weak(
                old_head,
                claim.new_head,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return claim,
                Err(current) => old_head = current,
            }
        }
    }

    fn update_tail(&self, single: bool, claim: &Claim) {
        if !single {
            // Reservations that preceded ours publish first. Acquire chains
            // their slot copies into our Release, so one Acquire of our tail
            // on the opposite side covers every earlier reservation too.
            while self.tail.load(Ordering::Acquire) != claim.old_head {
                spin_loop();
            }
        }
        self.tail.store(claim.new_head, Ordering::Release);
    }
}

// HTS word layout: head in the low half, tail in the high half.
#[inline]
const fn pack_ht(head: u32, tail: u32) -> u64 {
    ((tail as u64) << 32) | head as u64
}

#[inline]
const fn ht_head(raw: u64) -> u32 {
    raw as u32
}

#[inline]
const fn ht_tail(raw: u64) -> u32 {
    (raw >> 32) as u32
}

/// Head and tail packed into one atomically updated word.
pub(crate) struct HtsCursor {
    ht: AtomicU64,
}

impl HtsCursor {
    fn new() -> Self {
        Self {
            ht: AtomicU64::new(0),
        }
    }

    fn move_head(
        &self,
        opposite: &HeadTail,
        capacity: u32,
        requested: u32,
        behavior: Behavior,
    ) -> Claim {
        let mut op = self.ht.load(Ordering::Acquire);
        loop {
            // Wait out the reservation in flight, if any. The Acquire reload
            // also keeps our head/tail read ahead of the opposite tail read.
            while ht_head(op) != ht_tail(op) {
                spin_loop();
                op = self.ht.load(Ordering::Acquire);
            }

            let head = ht_head(op);
            let entries = capacity.wrapping_add(opposite.tail()).wrapping_sub(head);
            let n = behavior.clamp(requested, entries);
            if n == 0 {
                return Claim::none(head, entries);
            }
            debug_assert_claim_within!(n, entries, requested);

            // Acquire on both outcomes: neither the opposite tail read nor the
            // element copy may be hoisted above the reservation.
            let np = pack_ht(head.wrapping_add(n), ht_tail(op));
            match self
                .ht
                .compare_exchange_weak(op, np, Ordering::Acquire, Ordering::Acquire)
            {
                Ok(_) => return Claim::new(head, n, entries),
                Err(current) => op = current,
            }
        }
    }

    fn update_tail(&self, claim: &Claim) {
        // The reservation started from head == tail and every other thread is
        // waiting for them to be equal again, so nobody else writes the word
        // until this store lands.
        self.ht
            .store(pack_ht(claim.new_head, claim.new_head), Ordering::Release);
    }
}

// RTS word layout: reference count in the low half, position in the high half.
#[inline]
const fn pack_poscnt(pos: u32, cnt: u32) -> u64 {
    ((pos as u64) << 32) | cnt as u64
}

#[inline]
const fn poscnt_pos(raw: u64) -> u32 {
    (raw >> 32) as u32
}

#[inline]
const fn poscnt_cnt(raw: u64) -> u32 {
    raw as u32
}

/// Relaxed tail sync state: `{pos, cnt}` for head and tail plus the maximum
/// head/tail distance.
pub(crate) struct RtsCursor {
    head: AtomicU64,
    tail: AtomicU64,
    htd_max: AtomicU32,
}

impl RtsCursor {
    fn new(htd_max: u32) -> Self {
        Self {
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            htd_max: AtomicU32::new(htd_max),
        }
    }

    /// Spins until head is at most `htd_max` ahead of tail.
    fn head_wait(&self, oh: &mut u64) {
        let max = self.htd_max.load(Ordering::Relaxed);
        while poscnt_pos(*oh).wrapping_sub(poscnt_pos(self.tail.load(Ordering::Relaxed))) > max {
            spin_loop();
            *oh = self.head.load(Ordering::Acquire);
        }
    }

    fn move_head(
        &self,
        opposite: &HeadTail,
        capacity: u32,
        requested: u32,
        behavior: Behavior,
    ) -> Claim {
        let mut oh = self.head.load(Ordering::Acquire);
        loop {
            self.head_wait(&mut oh);

            let head = poscnt_pos(oh);
            let entries = capacity.wrapping_add(opposite.tail()).wrapping_sub(head);
            let n = behavior.clamp(requested, entries);
            if n == 0 {
                return Claim::none(head, entries);
            }
            debug_assert_claim_within!(n, entries, requested);

            let nh = pack_poscnt(head.wrapping_add(n), poscnt_cnt(oh).wrapping_add(1));
            match self
                .head
                .compare_exchange_weak(oh, nh, Ordering::Acquire, Ordering::Acquire)
            {
                Ok(_) => return Claim::new(head, n, entries),
                Err(current) => oh = current,
            }
        }
    }

    fn update_tail(&self) {
        let mut ot = self.tail.load(Ordering::Acquire);
        loop {
            let h = self.head.load(Ordering::Relaxed);
            let cnt = poscnt_cnt(ot).wrapping_add(1);
            // Last one out of the overlapping reservations moves tail to head
            let pos = if cnt == poscnt_cnt(h) {
                poscnt_pos(h)
            } else {
                poscnt_pos(ot)
            };

            match self.tail.compare_exchange_weak(
                ot,
                pack_poscnt(pos, cnt),
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => ot = current,
            }
        }
    }
}

/// Cursor state of one side, tagged by its synchronization discipline.
///
/// The variant is chosen once at creation and never changes.
pub(crate) enum HeadTail {
    Single(Cursor),
    Multi(Cursor),
    Hts(HtsCursor),
    Rts(RtsCursor),
}

impl HeadTail {
    /// Creates zeroed cursors for `mode`; `htd_max` only matters for RTS.
    pub(crate) fn new(mode: SyncMode, htd_max: u32) -> Self {
        match mode {
            SyncMode::Single => Self::Single(Cursor::new()),
            SyncMode::Multi => Self::Multi(Cursor::new()),
            SyncMode::Hts => Self::Hts(HtsCursor::new()),
            SyncMode::Rts => Self::Rts(RtsCursor::new(htd_max)),
        }
    }

    pub(crate) fn sync_mode(&self) -> SyncMode {
        match self {
            Self::Single(_) => SyncMode::Single,
            Self::Multi(_) => SyncMode::Multi,
            Self::Hts(_) => SyncMode::Hts,
            Self::Rts(_) => SyncMode::Rts,
        }
    }

    /// Published tail, loaded with Acquire.
    #[inline]
    pub(crate) fn tail(&self) -> u32 {
        match self {
            Self::Single(c) | Self::Multi(c) => c.tail.load(Ordering::Acquire),
            Self::Hts(c) => ht_tail(c.ht.load(Ordering::Acquire)),
            Self::Rts(c) => poscnt_pos(c.tail.load(Ordering::Acquire)),
        }
    }

    /// Reserved head; a snapshot for diagnostics only.
    #[inline]
    pub(crate) fn head(&self) -> u32 {
        match self {
            Self::Single(c) | Self::Multi(c) => c.head.load(Ordering::Relaxed),
            Self::Hts(c) => ht_head(c.ht.load(Ordering::Relaxed)),
            Self::Rts(c) => poscnt_pos(c.head.load(Ordering::Relaxed)),
        }
    }

    /// Reserves up to `requested` slots on this side.
    ///
    /// `capacity` is the ring capacity on the producer side and zero on the
    /// consumer side, so `entries` comes out as free slots or available
    /// entries respectively.
    #[inline]
    pub(crate) fn move_head(
        &self,
        opposite: &HeadTail,
        capacity: u32,
        requested: u32,
        behavior: Behavior,
    ) -> Claim {
        match self {
            Self::Single(c) => c.move_head(true, opposite, capacity, requested, behavior),
            Self::Multi(c) => c.move_head(false, opposite, capacity, requested, behavior),
            Self::Hts(c) => c.move_head(opposite, capacity, requested, behavior),
            Self::Rts(c) => c.move_head(opposite, capacity, requested, behavior),
        }
    }

    /// Publishes a non-empty claim made by [`move_head`](Self::move_head).
    #[inline]
    pub(crate) fn update_tail(&self, claim: &Claim) {
        debug_assert!(claim.n != 0, "publishing an empty claim");
        match self {
            Self::Single(c) => c.update_tail(true, claim),
            Self::Multi(c) => c.update_tail(false, claim),
            Self::Hts(c) => c.update_tail(claim),
            Self::Rts(c) => c.update_tail(),
        }
    }

    /// Maximum head/tail distance, RTS only.
    pub(crate) fn htd_max(&self) -> Option<u32> {
        match self {
            Self::Rts(c) => Some(c.htd_max.load(Ordering::Relaxed)),
            _ => None,
        }
    }

    /// Sets the maximum head/tail distance; returns false when not RTS.
    pub(crate) fn set_htd_max(&self, max: u32) -> bool {
        match self {
            Self::Rts(c) => {
                c.htd_max.store(max, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Moves both cursors to `pos`. Only valid on a quiescent side.
    #[cfg(test)]
    pub(crate) fn reset_to(&self, pos: u32) {
        match self {
            Self::Single(c) | Self::Multi(c) => {
                c.head.store(pos, Ordering::Relaxed);
                c.tail.store(pos, Ordering::Relaxed);
            }
            Self::Hts(c) => c.ht.store(pack_ht(pos, pos), Ordering::Relaxed),
            Self::Rts(c) => {
                c.head.store(pack_poscnt(pos, 0), Ordering::Relaxed);
                c.tail.store(pack_poscnt(pos, 0), Ordering::Relaxed);
            }
        }
    }
}
