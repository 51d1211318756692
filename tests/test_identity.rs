// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Identities cross context boundaries as plain integers and only ever
// attach to a live object of the matching kind.

use libthreads::{BoundedQueue, Error, Identity, Kind, SharedCondition, SharedMutex};

#[test]
fn kinds_are_tagged() {
    let mtx = SharedMutex::create().expect("mutex");
    let cv = SharedCondition::create().expect("condition");
    let q = BoundedQueue::create(1, "binary").expect("queue");

    assert_eq!(mtx.identity().kind(), Some(Kind::Mutex));
    assert_eq!(cv.identity().kind(), Some(Kind::Condition));
    assert_eq!(q.identity().kind(), Some(Kind::Queue));
    assert_eq!(q.mutex().identity().kind(), Some(Kind::Mutex));
}

#[test]
fn raw_integer_round_trip() {
    let q = BoundedQueue::create(2, "binary").expect("queue");
    let raw: u64 = q.identity().into();
    let attached = BoundedQueue::attach(Identity::from_raw(raw)).expect("attach");
    assert_eq!(attached.identity(), q.identity());
    assert_eq!(attached.serialization(), "binary");
}

#[test]
fn cross_kind_attach_fails_closed() {
    let q = BoundedQueue::create(1, "binary").expect("queue");
    let mtx = SharedMutex::create().expect("mutex");

    match SharedMutex::attach(q.identity()) {
        Err(Error::InvalidIdentity { identity, expected }) => {
            assert_eq!(identity, q.identity());
            assert_eq!(expected, Kind::Mutex);
        }
        other => panic!("expected InvalidIdentity, got {:?}", other.map(|m| m.identity())),
    }
    assert!(BoundedQueue::attach(mtx.identity()).is_err());
    assert!(SharedCondition::attach(q.mutex().identity()).is_err());
}

#[test]
fn released_identity_is_not_reused_immediately() {
    let first = SharedMutex::create().expect("mutex");
    let stale = first.identity();
    first.release();

    let mut fresh = Vec::new();
    for _ in 0..16 {
        let m = SharedMutex::create().expect("mutex");
        assert_ne!(m.identity(), stale);
        fresh.push(m);
    }
    assert!(!SharedMutex::is_live(stale));
    assert!(SharedMutex::attach(stale).is_err());
}

#[test]
fn error_messages_name_the_kind() {
    let err = SharedCondition::attach(Identity::from_raw(42)).err().expect("error");
    assert!(err.to_string().contains("Condition"), "{err}");
}
