#![cfg(not(feature = "loom"))]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use syncring_rs::{Ring, RingFlags};

const MSG_PER_PRODUCER: u64 = 1_000_000;
const BATCH_SIZE: usize = 32;
const RING_SIZE: u32 = 1 << 12;

/// Pushes `MSG_PER_PRODUCER` values through `ring` from `producers` threads
/// into one consumer, in bursts of `BATCH_SIZE`.
fn pump(ring: &Arc<Ring<u64>>, producers: u64) {
    let handles: Vec<_> = (0..producers)
        .map(|_| {
            let ring = Arc::clone(ring);
            thread::spawn(move || {
                let batch: Vec<u64> = (0..BATCH_SIZE as u64).collect();
                let mut sent = 0u64;
                while sent < MSG_PER_PRODUCER {
                    let want = BATCH_SIZE.min((MSG_PER_PRODUCER - sent) as usize);
                    let t = ring.enqueue_burst(&batch[..want]);
                    if t.is_empty() {
                        std::hint::spin_loop();
                    }
                    sent += t.count as u64;
                }
            })
        })
        .collect();

    let target = MSG_PER_PRODUCER * producers;
    let mut out = [0u64; BATCH_SIZE];
    let mut count = 0u64;
    while count < target {
        let t = ring.dequeue_burst(&mut out);
        if t.is_empty() {
            std::hint::spin_loop();
            continue;
        }
        black_box(&out[..t.count]);
        count += t.count as u64;
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));

    group.bench_function("single_producer_consumer", |b| {
        b.iter(|| {
            let ring = Arc::new(Ring::<u64>::create(RING_SIZE, RingFlags::SPSC).unwrap());
            pump(&ring, 1);
        });
    });

    group.finish();
}

fn bench_mpsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc");

    let disciplines = [
        ("cas", RingFlags::MPSC),
        (
            "hts",
            RingFlags::MULTI_PRODUCER_HTS | RingFlags::SINGLE_CONSUMER,
        ),
        (
            "rts",
            RingFlags::MULTI_PRODUCER_RTS | RingFlags::SINGLE_CONSUMER,
        ),
    ];

    for (name, flags) in disciplines {
        for num_producers in [2u64, 4] {
            group.throughput(Throughput::Elements(MSG_PER_PRODUCER * num_producers));
            group.bench_with_input(
                BenchmarkId::new(name, format!("{}P_1C", num_producers)),
                &num_producers,
                |b, &n| {
                    b.iter(|| {
                        let ring = Arc::new(Ring::<u64>::create(RING_SIZE, flags).unwrap());
                        pump(&ring, n);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_bulk_vs_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");
    let msgs = 100_000u64;
    group.throughput(Throughput::Elements(msgs));

    group.bench_function("single_element", |b| {
        let ring = Ring::<u64>::create(RING_SIZE, RingFlags::SPSC).unwrap();
        b.iter(|| {
            for i in 0..msgs {
                ring.enqueue(i);
                black_box(ring.dequeue());
            }
        });
    });

    group.bench_function("bulk_32", |b| {
        let ring = Ring::<u64>::create(RING_SIZE, RingFlags::SPSC).unwrap();
        let batch: Vec<u64> = (0..BATCH_SIZE as u64).collect();
        let mut out = [0u64; BATCH_SIZE];
        b.iter(|| {
            for _ in 0..msgs / BATCH_SIZE as u64 {
                ring.enqueue_bulk(&batch);
                black_box(ring.dequeue_bulk(&mut out));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spsc, bench_mpsc, bench_bulk_vs_single);
criterion_main!(benches);
