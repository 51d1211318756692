// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Uncontended cost of the primitives.
//
// Run with:
//   cargo bench --bench sync
//
// Groups:
//   mutex: lock/unlock pair, attach/release pair
//   queue: push+pop through one slot at three payload sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use libthreads::{BoundedQueue, Payload, SharedMutex};

const SIZES: &[(&str, usize)] = &[("small_48", 48), ("medium_256", 256), ("large_4096", 4096)];

fn bench_mutex(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutex");
    let mtx = SharedMutex::create().expect("create");

    group.bench_function("lock_unlock", |b| {
        b.iter(|| {
            mtx.lock().expect("lock");
            mtx.unlock().expect("unlock");
        });
    });

    let id = mtx.identity();
    group.bench_function("attach_release", |b| {
        b.iter(|| black_box(SharedMutex::attach(id).expect("attach")).release());
    });

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    let q = BoundedQueue::create(16, "binary").expect("create");

    for &(label, size) in SIZES {
        let payload = Payload::from_vec(vec![0xABu8; size]);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &payload, |b, p| {
            b.iter(|| {
                q.push(Payload::new(), p.clone()).expect("push");
                black_box(q.pop().expect("pop"))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mutex, bench_queue);
criterion_main!(benches);
