// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Tests for SharedMutex: lifecycle, attach by identity, mutual exclusion.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use libthreads::{Error, Identity, SharedMutex};

#[test]
fn create() {
    let mtx = SharedMutex::create().expect("create");
    assert_eq!(mtx.ref_count(), 1);
    assert!(SharedMutex::is_live(mtx.identity()));
}

#[test]
fn lock_unlock() {
    let mtx = SharedMutex::create().expect("create");
    mtx.lock().expect("lock");
    mtx.unlock().expect("unlock");
}

#[test]
fn multiple_cycles() {
    let mtx = SharedMutex::create().expect("create");
    for _ in 0..100 {
        mtx.lock().expect("lock");
        mtx.unlock().expect("unlock");
    }
}

#[test]
fn try_lock() {
    let mtx = Arc::new(SharedMutex::create().expect("create"));
    assert!(mtx.try_lock().expect("try_lock"));

    let m2 = Arc::clone(&mtx);
    let contended = thread::spawn(move || m2.try_lock().expect("try_lock"))
        .join()
        .unwrap();
    assert!(!contended);

    mtx.unlock().expect("unlock");
}

#[test]
fn relock_from_owner_is_an_error() {
    let mtx = SharedMutex::create().expect("create");
    mtx.lock().expect("lock");
    assert!(matches!(mtx.lock(), Err(Error::Lock(_))));
    mtx.unlock().expect("unlock");
}

#[test]
fn unlock_without_lock_is_an_error() {
    let mtx = SharedMutex::create().expect("create");
    assert!(matches!(mtx.unlock(), Err(Error::Unlock(_))));
}

// Create once, attach twice, release in any order: the OS mutex goes away
// only after the third release.
#[test]
fn refcount_create_attach_release() {
    let a = SharedMutex::create().expect("create");
    let id = a.identity();
    let b = SharedMutex::attach(id).expect("attach b");
    let c = SharedMutex::attach(id).expect("attach c");
    assert_eq!(a.ref_count(), 3);
    assert_eq!(b.identity(), id);

    b.release();
    assert!(SharedMutex::is_live(id));
    assert_eq!(c.ref_count(), 2);

    a.release();
    assert!(SharedMutex::is_live(id));
    assert_eq!(c.ref_count(), 1);

    // Still usable through the remaining handle.
    c.lock().expect("lock");
    c.unlock().expect("unlock");

    c.release();
    assert!(!SharedMutex::is_live(id));
    assert!(matches!(
        SharedMutex::attach(id),
        Err(Error::InvalidIdentity { .. })
    ));
}

#[test]
fn clone_is_attach() {
    let a = SharedMutex::create().expect("create");
    let b = a.clone();
    assert_eq!(a.identity(), b.identity());
    assert_eq!(a.ref_count(), 2);
    drop(a);
    assert_eq!(b.ref_count(), 1);
}

#[test]
fn attach_from_raw_integer() {
    let a = SharedMutex::create().expect("create");
    let raw: u64 = a.identity().as_raw();

    let b = thread::spawn(move || {
        let b = SharedMutex::attach(Identity::from_raw(raw)).expect("attach");
        b.lock().expect("lock");
        b.unlock().expect("unlock");
        b.identity()
    })
    .join()
    .unwrap();

    assert_eq!(b, a.identity());
    assert_eq!(a.ref_count(), 1);
}

#[test]
fn attach_garbage_fails_closed() {
    assert!(matches!(
        SharedMutex::attach(Identity::from_raw(0)),
        Err(Error::InvalidIdentity { .. })
    ));
    assert!(matches!(
        SharedMutex::attach(Identity::from_raw(u64::MAX)),
        Err(Error::InvalidIdentity { .. })
    ));
}

#[test]
fn critical_section() {
    let mtx = SharedMutex::create().expect("create");
    let raw = mtx.identity().as_raw();
    let counter = Arc::new(AtomicI32::new(0));
    let iterations = 100;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                let mtx = SharedMutex::attach(Identity::from_raw(raw)).expect("attach");
                for _ in 0..iterations {
                    mtx.lock().expect("lock");
                    let v = counter.load(Ordering::Relaxed);
                    thread::yield_now();
                    counter.store(v + 1, Ordering::Relaxed);
                    mtx.unlock().expect("unlock");
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::Relaxed), iterations * 4);
    assert_eq!(mtx.ref_count(), 1);
}

// Two threads lock handles attached to the same identity: the second lock
// does not return until the first holder unlocks.
#[test]
fn lock_blocks_until_unlock() {
    let a = SharedMutex::create().expect("create");
    let raw = a.identity().as_raw();
    a.lock().expect("lock");

    let acquired = Arc::new(AtomicBool::new(false));
    let acq2 = Arc::clone(&acquired);
    let t = thread::spawn(move || {
        let b = SharedMutex::attach(Identity::from_raw(raw)).expect("attach");
        b.lock().expect("lock");
        acq2.store(true, Ordering::SeqCst);
        b.unlock().expect("unlock");
    });

    thread::sleep(Duration::from_millis(100));
    assert!(!acquired.load(Ordering::SeqCst), "second lock returned while held");

    a.unlock().expect("unlock");
    t.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn display_includes_identity() {
    let mtx = SharedMutex::create().expect("create");
    let s = mtx.to_string();
    assert!(s.starts_with("Mutex <0x"));
    assert!(s.contains(&mtx.identity().to_string()));
}
