// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Producer/consumer demo over a shared BoundedQueue.
//
// Usage:
//   demo_queue [producers] [consumers] [items_per_producer]
//
// The parent creates the queue and hands only its raw identity to each
// worker thread, which attaches by identity the way a fresh execution
// context would. Throughput is printed once per second.
// Set RUST_LOG=libthreads=debug to watch handles being created and destroyed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use libthreads::{BoundedQueue, Identity, NativeThread, Payload};
use tracing_subscriber::EnvFilter;

const CAPACITY: usize = 64;
const STOP: &[u8] = b"stop";

fn counting_thread(quit: Arc<AtomicBool>, counter: Arc<AtomicUsize>) {
    let mut i = 0usize;
    while !quit.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(100));
        i += 1;
        if i % 10 != 0 {
            continue;
        }
        println!("{} items/s", counter.swap(0, Ordering::Relaxed));
    }
}

fn produce((raw, first, count): (u64, u64, u64)) -> i32 {
    let q = match BoundedQueue::attach(Identity::from_raw(raw)) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("producer: {e}");
            return -1;
        }
    };
    let callback = Payload::from("consume");
    for n in first..first + count {
        if let Err(e) = q.push(callback.clone(), Payload::from_vec(n.to_le_bytes().to_vec())) {
            eprintln!("producer: {e}");
            return -1;
        }
    }
    0
}

fn consume((raw, counter): (u64, Arc<AtomicUsize>)) -> i32 {
    let q = match BoundedQueue::attach(Identity::from_raw(raw)) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("consumer: {e}");
            return -1;
        }
    };
    loop {
        match q.pop() {
            Ok(entry) if entry.callback.as_deref() == Some(STOP) => return 0,
            Ok(_) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                eprintln!("consumer: {e}");
                return -1;
            }
        }
    }
}

fn arg_or(args: &[String], i: usize, default: u64) -> u64 {
    args.get(i).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    let producers = arg_or(&args, 1, 2);
    let consumers = arg_or(&args, 2, 2);
    let per_producer = arg_or(&args, 3, 1_000_000);

    let queue = match BoundedQueue::create(CAPACITY, "le-u64") {
        Ok(q) => q,
        Err(e) => {
            eprintln!("demo_queue: {e}");
            std::process::exit(1);
        }
    };
    let raw = queue.identity().as_raw();
    println!("demo_queue: {queue} capacity {CAPACITY}, {producers} producers, {consumers} consumers");

    let quit = Arc::new(AtomicBool::new(false));
    let counter = Arc::new(AtomicUsize::new(0));
    let counting = {
        let (q, c) = (Arc::clone(&quit), Arc::clone(&counter));
        thread::spawn(move || counting_thread(q, c))
    };

    let mut workers = Vec::new();
    for c in 0..consumers {
        match NativeThread::start(consume, (raw, Arc::clone(&counter))) {
            Ok(t) => workers.push((format!("consumer {c}"), t)),
            Err(e) => eprintln!("demo_queue: {e}"),
        }
    }
    let mut producer_threads = Vec::new();
    for p in 0..producers {
        match NativeThread::start(produce, (raw, p * per_producer, per_producer)) {
            Ok(t) => producer_threads.push((format!("producer {p}"), t)),
            Err(e) => eprintln!("demo_queue: {e}"),
        }
    }

    for (name, t) in producer_threads {
        match t.join() {
            Ok(status) => println!("{name} exited with {status}"),
            Err(e) => eprintln!("{name}: {e}"),
        }
    }
    for _ in 0..workers.len() {
        if let Err(e) = queue.push(Payload::from_slice(STOP), Payload::new()) {
            eprintln!("demo_queue: {e}");
        }
    }
    for (name, t) in workers {
        match t.join() {
            Ok(status) => println!("{name} exited with {status}"),
            Err(e) => eprintln!("{name}: {e}"),
        }
    }

    quit.store(true, Ordering::Release);
    let _ = counting.join();
    println!("demo_queue: done");
}
