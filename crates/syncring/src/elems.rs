//! Element copy between a caller's buffer and the slot array.
//!
//! A span of `n` slots starting at `cursor & mask` may run past the end of the
//! array; it is then split into two contiguous runs, the second starting at
//! slot 0. No synchronization happens here: callers copy strictly between
//! their head move and tail publish.

use std::mem::MaybeUninit;
use std::ptr;

/// Splits a span of `n` slots starting at `idx` into the run up to the end of
/// the array and the wrapped remainder.
#[inline]
pub(crate) fn split_span(size: usize, idx: usize, n: usize) -> (usize, usize) {
    debug_assert!(idx < size && n <= size, "span {idx}+{n} outside {size} slots");
    if idx + n <= size {
        (n, 0)
    } else {
        let first = size - idx;
        (first, n - first)
    }
}

/// Copies `src` into the slots starting at `cursor`.
///
/// # Safety
///
/// `slots` must point to `mask + 1` slots of `T`, and the span
/// `[cursor, cursor + src.len())` must be reserved by the caller's head move
/// and not yet published.
#[inline]
pub(crate) unsafe fn write_slots<T: Copy>(slots: *mut T, mask: u32, cursor: u32, src: &[T]) {
    let size = mask as usize + 1;
    let idx = (cursor & mask) as usize;
    let (first, wrapped) = split_span(size, idx, src.len());

    // SAFETY: both runs lie inside the slot array (split_span) and the
    // reserved span is not touched by any other thread until we publish.
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), slots.add(idx), first);
        if wrapped != 0 {
            ptr::copy_nonoverlapping(src.as_ptr().add(first), slots, wrapped);
        }
    }
}

/// Copies the slots starting at `cursor` into `dst`.
///
/// # Safety
///
/// `slots` must point to `mask + 1` slots of `T`, and the span
/// `[cursor, cursor + dst.len())` must hold elements published by the
/// producer side and be reserved by the caller's head move. On return every
/// element of `dst` is initialized.
#[inline]
pub(crate) unsafe fn read_slots<T: Copy>(
    slots: *const T,
    mask: u32,
    cursor: u32,
    dst: &mut [MaybeUninit<T>],
) {
    let size = mask as usize + 1;
    let idx = (cursor & mask) as usize;
    let (first, wrapped) = split_span(size, idx, dst.len());

    // SAFETY: see write_slots; the producer's Release publish of these slots
    // happened-before our Acquire load of its tail.
    unsafe {
        let dst = dst.as_mut_ptr().cast::<T>();
        ptr::copy_nonoverlapping(slots.add(idx), dst, first);
        if wrapped != 0 {
            ptr::copy_nonoverlapping(slots, dst.add(first), wrapped);
        }
    }
}
