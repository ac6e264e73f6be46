use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use syncring_rs::{Config, MetricsSnapshot, Ring, RingFlags};

const N_WORKERS: usize = 4;
const KEYS_PER_WORKER: u64 = 250_000;
const PULL: usize = 32;

/// A routed work item: the key and the index of the worker that produced it.
type Item = (u64, u32);

fn owner_of(key: u64) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % N_WORKERS as u64) as usize
}

fn main() {
    println!("SyncRing Key Routing Example");
    println!("============================\n");

    // Each worker owns one ring: any worker may enqueue, only the owner dequeues
    let config = Config::default()
        .with_flags(RingFlags::MPSC)
        .with_metrics(true);
    let rings: Arc<Vec<Ring<Item>>> = Arc::new(
        (0..N_WORKERS)
            .map(|_| Ring::new(config).expect("valid ring config"))
            .collect(),
    );
    let producing = Arc::new(AtomicBool::new(true));

    println!("Configuration:");
    println!("  Workers: {}", N_WORKERS);
    println!("  Ring capacity: {} slots", rings[0].capacity());
    println!(
        "  Producers: {} (shared: {})",
        rings[0].producer_sync(),
        rings[0].producer_sync().is_multi_thread()
    );
    println!("  Consumer: {}", rings[0].consumer_sync());
    println!("  Keys per worker: {}", KEYS_PER_WORKER);
    println!("  Pull size: {}\n", PULL);

    let start = Instant::now();

    let workers: Vec<_> = (0..N_WORKERS)
        .map(|id| {
            let rings = Arc::clone(&rings);
            let producing = Arc::clone(&producing);
            thread::spawn(move || {
                let own = &rings[id];
                let mut out = [(0u64, 0u32); PULL];
                let mut handled = 0u64;

                let mut drain = |handled: &mut u64| loop {
                    let t = own.dequeue_burst(&mut out);
                    for &(key, _from) in &out[..t.count] {
                        debug_assert_eq!(owner_of(key), id);
                        *handled += 1;
                    }
                    if t.remaining == 0 {
                        break;
                    }
                };

                for i in 0..KEYS_PER_WORKER {
                    let key = i * N_WORKERS as u64 + id as u64;
                    let target = &rings[owner_of(key)];
                    while !target.enqueue((key, id as u32)) {
                        // Our own ring may be the full one
                        drain(&mut handled);
                        thread::yield_now();
                    }
                    if i % PULL as u64 == 0 {
                        drain(&mut handled);
                    }
                }

                while producing.load(Ordering::Acquire) || !own.is_empty() {
                    drain(&mut handled);
                    thread::yield_now();
                }
                handled
            })
        })
        .collect();

    // Producing stops once every worker has enqueued its keys; workers keep
    // draining until then, so wait for the total to show up in the metrics.
    let total_keys = KEYS_PER_WORKER * N_WORKERS as u64;
    loop {
        let enqueued: u64 = rings.iter().map(|r| r.metrics().elements_enqueued).sum();
        if enqueued == total_keys {
            break;
        }
        thread::yield_now();
    }
    producing.store(false, Ordering::Release);

    let handled: Vec<u64> = workers
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();
    let elapsed = start.elapsed();

    let mut totals = MetricsSnapshot::default();
    for ring in rings.iter() {
        totals += ring.metrics();
    }

    println!("Results:");
    for (id, count) in handled.iter().enumerate() {
        println!("  Worker {} handled {} keys", id, count);
    }
    println!("  Enqueued: {}", totals.elements_enqueued);
    println!("  Dequeued: {}", totals.elements_dequeued);
    println!("  Full-ring retries: {}", totals.enqueue_no_space);
    println!("  Time: {:?}", elapsed);
    println!(
        "  Throughput: {:.2} M keys/sec",
        totals.elements_dequeued as f64 / elapsed.as_secs_f64() / 1e6
    );

    assert_eq!(handled.iter().sum::<u64>(), total_keys);
}
