//! Multi-threaded tests for every producer/consumer discipline.
//!
//! Each producer tags its elements with its id and a sequence number. Since
//! one ring is a FIFO, any single consumer must see each producer's sequence
//! in increasing order, and across all consumers every element must be seen
//! exactly once.

#![cfg(not(feature = "loom"))]

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use syncring_rs::{Config, Ring, RingFlags, SyncMode};

type Tagged = (u32, u64);

const BURST: usize = 16;

fn run_producers(
    ring: &Arc<Ring<Tagged>>,
    producers: u32,
    per_producer: u64,
    bulk: bool,
) -> Vec<thread::JoinHandle<()>> {
    (0..producers)
        .map(|id| {
            let ring = Arc::clone(ring);
            thread::spawn(move || {
                let mut seq = 0u64;
                let mut batch = Vec::with_capacity(BURST);
                while seq < per_producer {
                    batch.clear();
                    let end = (seq + BURST as u64).min(per_producer);
                    batch.extend((seq..end).map(|s| (id, s)));

                    let t = if bulk {
                        ring.enqueue_bulk(&batch)
                    } else {
                        ring.enqueue_burst(&batch)
                    };
                    if t.is_empty() {
                        thread::yield_now();
                    }
                    seq += t.count as u64;
                }
            })
        })
        .collect()
}

/// Drains until `total` elements have been consumed across all consumers.
fn run_consumers(
    ring: &Arc<Ring<Tagged>>,
    consumers: usize,
    total: usize,
) -> Vec<thread::JoinHandle<Vec<Tagged>>> {
    let consumed = Arc::new(AtomicUsize::new(0));
    (0..consumers)
        .map(|_| {
            let ring = Arc::clone(ring);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                let mut seen = Vec::new();
                let mut out = [(0u32, 0u64); BURST];
                while consumed.load(Ordering::Relaxed) < total {
                    let t = ring.dequeue_burst(&mut out);
                    if t.is_empty() {
                        thread::yield_now();
                        continue;
                    }
                    seen.extend_from_slice(&out[..t.count]);
                    consumed.fetch_add(t.count, Ordering::Relaxed);
                }
                seen
            })
        })
        .collect()
}

fn check_streams(streams: &[Vec<Tagged>], producers: u32, per_producer: u64) {
    for stream in streams {
        let mut last: Vec<Option<u64>> = vec![None; producers as usize];
        for &(id, seq) in stream {
            let prev = last[id as usize].replace(seq);
            if let Some(prev) = prev {
                assert!(
                    seq > prev,
                    "producer {} order violated: {} after {}",
                    id,
                    seq,
                    prev
                );
            }
        }
    }

    let mut all: Vec<Tagged> = streams.iter().flatten().copied().collect();
    assert_eq!(all.len(), producers as usize * per_producer as usize);
    all.sort_unstable();
    all.dedup();
    assert_eq!(
        all.len(),
        producers as usize * per_producer as usize,
        "duplicate elements"
    );
}

fn stress(flags: RingFlags, count: u32, producers: u32, consumers: usize, per_producer: u64) {
    let config = Config::new(count, RingFlags::empty(), false)
        .with_flags(flags)
        .with_metrics(true);
    let ring = Arc::new(Ring::<Tagged>::new(config).unwrap());
    if producers > 1 {
        assert!(ring.producer_sync().is_multi_thread());
    }
    if consumers > 1 {
        assert!(ring.consumer_sync().is_multi_thread());
    }
    let total = producers as usize * per_producer as usize;

    let consumer_handles = run_consumers(&ring, consumers, total);
    // Bulk requests larger than the ring could never succeed
    let bulk = ring.capacity() >= BURST;
    let producer_handles = run_producers(&ring, producers, per_producer, bulk);

    for handle in producer_handles {
        handle.join().unwrap();
    }
    let streams: Vec<Vec<Tagged>> = consumer_handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    check_streams(&streams, producers, per_producer);
    assert!(ring.is_empty());

    let metrics = ring.metrics();
    assert_eq!(metrics.elements_enqueued, total as u64);
    assert_eq!(metrics.elements_dequeued, total as u64);
}

#[test]
fn test_spsc_fifo_repeated() {
    for _ in 0..20 {
        let ring = Arc::new(Ring::<Tagged>::create(64, RingFlags::SPSC).unwrap());
        assert_eq!(ring.producer_sync(), SyncMode::Single);
        assert_eq!(ring.consumer_sync(), SyncMode::Single);
        assert!(!ring.producer_sync().is_multi_thread());

        let consumer = run_consumers(&ring, 1, 10_000);
        let producer = run_producers(&ring, 1, 10_000, false);

        for handle in producer {
            handle.join().unwrap();
        }
        let streams: Vec<_> = consumer.into_iter().map(|h| h.join().unwrap()).collect();

        let expected: Vec<Tagged> = (0..10_000).map(|s| (0, s)).collect();
        assert_eq!(streams[0], expected);
    }
}

#[test]
fn test_spsc_random_batch_sizes() {
    const N: u64 = 50_000;
    let ring = Arc::new(Ring::<u64>::create(32, RingFlags::SPSC).unwrap());

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let mut next = 0u64;
            while next < N {
                let want = rng.gen_range(1..=BURST as u64).min(N - next);
                let batch: Vec<u64> = (next..next + want).collect();
                let t = if rng.gen_bool(0.5) {
                    ring.enqueue_bulk(&batch)
                } else {
                    ring.enqueue_burst(&batch)
                };
                next += t.count as u64;
            }
        })
    };

    let mut rng = rand::thread_rng();
    let mut out = [0u64; BURST];
    let mut expected = 0u64;
    while expected < N {
        let want = rng.gen_range(1..=BURST);
        let t = ring.dequeue_burst(&mut out[..want]);
        for &value in &out[..t.count] {
            assert_eq!(value, expected, "FIFO violation");
            expected += 1;
        }
    }

    producer.join().unwrap();
    assert!(ring.is_empty());
}

#[test]
fn test_mpsc_cas() {
    stress(RingFlags::MPSC, 256, 4, 1, 20_000);
}

#[test]
fn test_mpmc_cas() {
    stress(RingFlags::empty(), 256, 4, 3, 20_000);
}

#[test]
fn test_mpmc_hts() {
    stress(
        RingFlags::MULTI_PRODUCER_HTS | RingFlags::MULTI_CONSUMER_HTS,
        256,
        4,
        3,
        20_000,
    );
}

#[test]
fn test_mpmc_rts() {
    stress(
        RingFlags::MULTI_PRODUCER_RTS | RingFlags::MULTI_CONSUMER_RTS,
        256,
        4,
        3,
        20_000,
    );
}

#[test]
fn test_mixed_disciplines() {
    // RTS producers feeding a single consumer, HTS producers feeding CAS consumers
    stress(
        RingFlags::MULTI_PRODUCER_RTS | RingFlags::SINGLE_CONSUMER,
        128,
        3,
        1,
        10_000,
    );
    stress(RingFlags::MULTI_PRODUCER_HTS, 128, 3, 2, 10_000);
}

#[test]
fn test_tight_exact_ring_under_contention() {
    // Capacity 3 keeps the ring full or empty most of the time
    stress(
        RingFlags::EXACT_SIZE | RingFlags::MULTI_PRODUCER_RTS,
        3,
        3,
        2,
        5_000,
    );
}

#[test]
fn test_rts_with_adjusted_distance() {
    let ring = Arc::new(
        Ring::<Tagged>::create(
            256,
            RingFlags::MULTI_PRODUCER_RTS | RingFlags::MULTI_CONSUMER_RTS,
        )
        .unwrap(),
    );
    ring.set_producer_htd_max(1).unwrap();
    ring.set_consumer_htd_max(64).unwrap();

    let consumers = run_consumers(&ring, 2, 4 * 5_000);
    let producers = run_producers(&ring, 4, 5_000, false);
    for handle in producers {
        handle.join().unwrap();
    }
    let streams: Vec<_> = consumers.into_iter().map(|h| h.join().unwrap()).collect();
    check_streams(&streams, 4, 5_000);
}
