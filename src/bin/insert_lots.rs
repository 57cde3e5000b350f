use eht::ExtendibleHashMap;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

fn main() {
    const NUM_THREADS: usize = 64;
    const KEYS_PER_THREAD: u64 = 1 << 16;

    let keep_running = Arc::new(AtomicBool::new(true));
    let map = Arc::new(ExtendibleHashMap::with_limits(8, 50));
    let threads: Vec<_> = (0..NUM_THREADS as u64)
        .map(|i| {
            let keep_running = keep_running.clone();
            let map = map.clone();

            thread::spawn(move || {
                let base = i * KEYS_PER_THREAD;

                while keep_running.load(Ordering::Relaxed) {
                    for k in base..base + KEYS_PER_THREAD {
                        map.insert(k, k);
                    }
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_secs(5));
    keep_running.store(false, Ordering::Relaxed);

    let results = threads.into_iter().map(|t| t.join());

    for result in results.into_iter() {
        assert!(result.is_ok());
    }

    assert_eq!(map.len(), NUM_THREADS * KEYS_PER_THREAD as usize);

    println!(
        "{} pairs in {} buckets at global depth {}",
        map.len(),
        map.bucket_count(),
        map.global_depth()
    );
}
