//! SyncRing - Bounded Lock-Free Ring With Per-Side Sync Disciplines
//!
//! A fixed-capacity FIFO of fixed-size elements shared by any number of
//! producer and consumer threads. Each side picks its synchronization
//! discipline at creation:
//!
//! - **single**: one thread drives the side, no atomic read-modify-write
//! - **CAS** (default): head advanced by compare-and-swap, tails published in
//!   reservation order
//! - **HTS**: head/tail sync, a single reservation in flight at a time
//! - **RTS**: relaxed tail sync, the last finisher publishes for everyone
//!
//! Cursors are 32-bit and wrap freely; the slot array is a power of two and
//! every index is a cursor masked by `size - 1`.
//!
//! # Key Features
//!
//! - Bulk (all-or-nothing) and burst (as many as possible) transfers
//! - Remaining free/available counts reported with every transfer
//! - Exact-size mode for capacities that are not `2^k - 1`
//! - Cache-line padded cursor groups
//! - Optional per-ring metrics
//!
//! # Example
//!
//! ```
//! use syncring_rs::{Ring, RingFlags};
//!
//! let ring = Ring::<u64>::create(1024, RingFlags::SPSC).unwrap();
//!
//! // Single elements
//! assert!(ring.enqueue(42));
//! assert_eq!(ring.dequeue(), Some(42));
//!
//! // Bulk: all or nothing
//! let sent = ring.enqueue_bulk(&[1, 2, 3]);
//! assert_eq!(sent.count, 3);
//!
//! // Burst: as many as available
//! let mut out = [0u64; 8];
//! let got = ring.dequeue_burst(&mut out);
//! assert_eq!(&out[..got.count], &[1, 2, 3]);
//! ```

mod backoff;
mod config;
mod elems;
mod error;
mod flags;
mod headtail;
mod invariants;
mod metrics;
mod ring;
mod sync;

pub use backoff::Backoff;
pub use config::{Config, Geometry, HTS_CONFIG, MPSC_CONFIG, SIZE_MASK, SPSC_CONFIG};
pub use error::RingError;
pub use flags::{RingFlags, Side, SyncMode};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::{Ring, Transfer};
