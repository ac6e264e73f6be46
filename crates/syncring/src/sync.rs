//! Atomic primitives used by the cursor protocol.
//!
//! Under the `loom` feature every cursor atomic, fence and spin hint is routed
//! through loom so the real `Ring` can be model-checked.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};

/// CPU pause hint for the bounded spin-waits of the protocol.
///
/// Loom needs to be told that the thread cannot make progress, otherwise the
/// model would spin forever on a single interleaving.
#[inline(always)]
pub(crate) fn spin_loop() {
    #[cfg(feature = "loom")]
    loom::thread::yield_now();

    #[cfg(not(feature = "loom"))]
    std::hint::spin_loop();
}
