use eht::ExtendibleHashMap;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_single_thread_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("eht: single threaded insertion");

    for &numel in [8u64, 64, 512, 4096, 32768].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(numel), &numel, |b, &numel| {
            let map = ExtendibleHashMap::new();

            for i in 0..numel {
                map.insert(i, i);
            }

            b.iter(|| map.insert(black_box(numel + 1), numel + 1))
        });
    }

    group.finish();
}

fn bench_single_thread_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("eht: single threaded get");

    for &numel in [8u64, 64, 512, 4096, 32768].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(numel), &numel, |b, &numel| {
            let map = ExtendibleHashMap::new();

            for i in 0..numel {
                map.insert(i, i);
            }

            b.iter(|| map.get(black_box(&(numel / 2))))
        });
    }

    group.finish();
}

fn bench_multi_thread_insertion(c: &mut Criterion) {
    let num_threads = num_cpus::get();

    let map = Arc::new(ExtendibleHashMap::new());
    let keep_going = Arc::new(AtomicBool::new(true));

    let threads: Vec<_> = (0..num_threads - 1)
        .map(|i| {
            let map = map.clone();
            let keep_going = keep_going.clone();

            thread::spawn(move || {
                while keep_going.load(Ordering::SeqCst) {
                    map.insert(black_box(i), i);
                }
            })
        })
        .collect();

    {
        let map = map.clone();

        c.bench_function("eht: multithreaded insertion", move |b| {
            b.iter(|| map.insert(black_box(num_threads + 1), num_threads + 1))
        });
    }

    keep_going.store(false, Ordering::SeqCst);

    for result in threads.into_iter().map(|t| t.join()) {
        assert!(result.is_ok());
    }
}

criterion_group!(
    benches,
    bench_single_thread_insertion,
    bench_single_thread_get,
    bench_multi_thread_insertion
);
criterion_main!(benches);
