// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Fixed-capacity blocking queue shared between execution contexts.
//
// Each slot holds an optional callback payload and an optional argument
// payload. One SharedMutex guards all protocol state (head, tail, the
// empty/full flags and the slots); two SharedConditions carry the not-full
// and not-empty wakeups. The queue is attachable by identity exactly like
// the primitives it embeds.

use std::cell::UnsafeCell;
use std::collections::TryReserveError;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::identity::{Identity, Kind};
use crate::registry::{Handle, Registered, Registry};
use crate::{Payload, SharedCondition, SharedMutex};

#[derive(Default)]
struct Slot {
    callback: Option<Payload>,
    arg: Option<Payload>,
}

struct QueueState {
    slots: Box<[Slot]>,
    head: usize,
    tail: usize,
    is_empty: bool,
    is_full: bool,
}

pub(crate) struct QueueShared {
    capacity: usize,
    serialization: String,
    mutex: SharedMutex,
    not_full: SharedCondition,
    not_empty: SharedCondition,
    state: UnsafeCell<QueueState>,
}

// Safety: `state` is only reached through `QueueAccess`, which holds `mutex`.
unsafe impl Sync for QueueShared {}

impl Registered for QueueShared {
    const KIND: Kind = Kind::Queue;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<QueueShared>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Kind::Queue))
    }
}

fn alloc_slots(capacity: usize) -> Result<Box<[Slot]>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|e: TryReserveError| {
            Error::ResourceExhausted(io::Error::new(io::ErrorKind::OutOfMemory, e))
        })?;
    slots.resize_with(capacity, Slot::default);
    Ok(slots.into_boxed_slice())
}

/// One dequeued element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueEntry {
    pub callback: Option<Payload>,
    pub arg: Option<Payload>,
}

/// A fixed-capacity circular queue of payload pairs with blocking push/pop.
///
/// `push` blocks while the queue is full and `pop` blocks while it is empty.
/// FIFO order holds across slots; the order in which concurrent producers (or
/// concurrent consumers) get through is whichever takes the mutex first.
///
/// Other contexts attach with [`BoundedQueue::attach`] and share the same
/// storage. The slots, embedded mutex and conditions are released when the
/// last handle goes.
pub struct BoundedQueue {
    handle: Handle<QueueShared>,
}

impl BoundedQueue {
    /// Allocate `capacity` empty slots plus a fresh mutex and condition pair.
    ///
    /// All-or-nothing: on failure every resource created so far is released.
    pub fn create(capacity: usize, serialization: &str) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        // Early returns drop whatever was already built.
        let mutex = SharedMutex::create()?;
        let not_full = SharedCondition::create()?;
        let not_empty = SharedCondition::create()?;
        let slots = alloc_slots(capacity)?;

        let shared = QueueShared {
            capacity,
            serialization: serialization.to_owned(),
            mutex,
            not_full,
            not_empty,
            state: UnsafeCell::new(QueueState {
                slots,
                head: 0,
                tail: 0,
                is_empty: true,
                is_full: false,
            }),
        };
        Ok(Self {
            handle: Handle::create(shared)?,
        })
    }

    /// Take a new reference on the queue named by `id`.
    pub fn attach(id: Identity) -> Result<Self> {
        Ok(Self {
            handle: Handle::attach(id)?,
        })
    }

    pub fn is_live(id: Identity) -> bool {
        Handle::<QueueShared>::is_live(id)
    }

    pub fn identity(&self) -> Identity {
        self.handle.identity()
    }

    pub fn ref_count(&self) -> usize {
        self.handle.ref_count()
    }

    fn shared(&self) -> &QueueShared {
        self.handle.get()
    }

    pub fn capacity(&self) -> usize {
        self.shared().capacity
    }

    /// The caller-defined tag describing how payloads are encoded.
    pub fn serialization(&self) -> &str {
        &self.shared().serialization
    }

    /// The mutex guarding all queue state.
    pub fn mutex(&self) -> &SharedMutex {
        &self.shared().mutex
    }

    pub fn not_full(&self) -> &SharedCondition {
        &self.shared().not_full
    }

    pub fn not_empty(&self) -> &SharedCondition {
        &self.shared().not_empty
    }

    /// Lock the queue mutex and return a guard over the protocol state.
    pub fn lock(&self) -> Result<QueueAccess<'_>> {
        QueueAccess::new(self.shared())
    }

    /// Block while the queue is full, then append one element.
    pub fn push(&self, callback: Payload, arg: Payload) -> Result<()> {
        let mut access = self.lock()?;
        access.wait_not_full()?;
        access.enqueue(callback, arg)
    }

    /// Append one element if a slot is free. Returns `Ok(false)` when full.
    pub fn try_push(&self, callback: Payload, arg: Payload) -> Result<bool> {
        let mut access = self.lock()?;
        if access.is_full() {
            return Ok(false);
        }
        access.enqueue(callback, arg)?;
        Ok(true)
    }

    /// Block while the queue is empty, then remove the oldest element.
    pub fn pop(&self) -> Result<QueueEntry> {
        let mut access = self.lock()?;
        access.wait_not_empty()?;
        access.dequeue()
    }

    /// Remove the oldest element if there is one.
    pub fn try_pop(&self) -> Result<Option<QueueEntry>> {
        let mut access = self.lock()?;
        if access.is_empty() {
            return Ok(None);
        }
        access.dequeue().map(Some)
    }

    /// Give back this handle's reference. Same as dropping it.
    pub fn release(self) {}
}

impl Clone for BoundedQueue {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl fmt::Display for BoundedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue <{}>", self.identity())
    }
}

impl fmt::Debug for BoundedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("identity", &self.identity())
            .field("capacity", &self.capacity())
            .field("serialization", &self.serialization())
            .field("refs", &self.ref_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// QueueAccess: RAII guard over the locked protocol state
// ---------------------------------------------------------------------------

/// Holds the queue mutex for its lifetime and exposes the raw protocol state.
///
/// Getters and setters here are the low-level building blocks of
/// [`BoundedQueue::push`] and [`BoundedQueue::pop`]. A caller that mutates
/// `head`, `tail` or the flags directly is responsible for keeping them
/// consistent. The guard must be dropped on the thread that created it.
pub struct QueueAccess<'a> {
    queue: &'a QueueShared,
    _not_send: PhantomData<*const ()>,
}

impl<'a> QueueAccess<'a> {
    fn new(queue: &'a QueueShared) -> Result<Self> {
        queue.mutex.lock()?;
        queue.mutex.set_guarded(true);
        Ok(Self {
            queue,
            _not_send: PhantomData,
        })
    }

    fn state(&self) -> &QueueState {
        // Safety: the queue mutex is held for the guard's lifetime; the guard
        // flag stops it being unlocked or waited on behind our back.
        unsafe { &*self.queue.state.get() }
    }

    fn state_mut(&mut self) -> &mut QueueState {
        // Safety: as above, and `&mut self` rules out aliasing within this thread.
        unsafe { &mut *self.queue.state.get() }
    }

    fn check_index(&self, index: usize) -> Result<usize> {
        if index >= self.queue.capacity {
            return Err(Error::IndexOutOfRange {
                index,
                capacity: self.queue.capacity,
            });
        }
        Ok(index)
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity
    }

    pub fn head(&self) -> usize {
        self.state().head
    }

    pub fn set_head(&mut self, head: usize) -> Result<()> {
        let head = self.check_index(head)?;
        self.state_mut().head = head;
        Ok(())
    }

    pub fn tail(&self) -> usize {
        self.state().tail
    }

    pub fn set_tail(&mut self, tail: usize) -> Result<()> {
        let tail = self.check_index(tail)?;
        self.state_mut().tail = tail;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty
    }

    pub fn set_empty(&mut self, is_empty: bool) {
        self.state_mut().is_empty = is_empty;
    }

    pub fn is_full(&self) -> bool {
        self.state().is_full
    }

    pub fn set_full(&mut self, is_full: bool) {
        self.state_mut().is_full = is_full;
    }

    /// Number of occupied positions between `head` and `tail`.
    pub fn len(&self) -> usize {
        let s = self.state();
        if s.is_full {
            self.queue.capacity
        } else {
            (s.tail + self.queue.capacity - s.head) % self.queue.capacity
        }
    }

    /// The callback payload in slot `index`, retained for the caller.
    pub fn callback(&self, index: usize) -> Result<Option<Payload>> {
        let index = self.check_index(index)?;
        Ok(self.state().slots[index].callback.clone())
    }

    /// Store `payload` in slot `index`, releasing whatever was there.
    pub fn set_callback(&mut self, index: usize, payload: Payload) -> Result<()> {
        let index = self.check_index(index)?;
        self.state_mut().slots[index].callback = Some(payload);
        Ok(())
    }

    pub fn arg(&self, index: usize) -> Result<Option<Payload>> {
        let index = self.check_index(index)?;
        Ok(self.state().slots[index].arg.clone())
    }

    pub fn set_arg(&mut self, index: usize, payload: Payload) -> Result<()> {
        let index = self.check_index(index)?;
        self.state_mut().slots[index].arg = Some(payload);
        Ok(())
    }

    /// Sleep on `not_full` until a slot is free. Tolerates spurious wakeups.
    pub fn wait_not_full(&mut self) -> Result<()> {
        while self.is_full() {
            self.queue.not_full.wait_guarded(&self.queue.mutex)?;
        }
        Ok(())
    }

    /// Sleep on `not_empty` until an element is available.
    pub fn wait_not_empty(&mut self) -> Result<()> {
        while self.is_empty() {
            self.queue.not_empty.wait_guarded(&self.queue.mutex)?;
        }
        Ok(())
    }

    pub fn signal_not_full(&self) -> Result<()> {
        self.queue.not_full.signal()
    }

    pub fn signal_not_empty(&self) -> Result<()> {
        self.queue.not_empty.signal()
    }

    /// Write into the slot at `tail`, advance `tail` and wake one consumer.
    /// The queue must not be full. Once the slot is written the element is
    /// enqueued; a failed wakeup is logged, not returned.
    pub fn enqueue(&mut self, callback: Payload, arg: Payload) -> Result<()> {
        debug_assert!(!self.is_full(), "enqueue on a full queue");
        let tail = self.tail();
        self.set_callback(tail, callback)?;
        self.set_arg(tail, arg)?;

        let capacity = self.queue.capacity;
        let s = self.state_mut();
        s.tail = (tail + 1) % capacity;
        s.is_empty = false;
        s.is_full = s.tail == s.head;
        if let Err(e) = self.signal_not_empty() {
            tracing::error!(queue_mutex = %self.queue.mutex, error = %e, "not_empty signal failed");
        }
        Ok(())
    }

    /// Read the slot at `head`, advance `head` and wake one producer.
    /// The queue must not be empty. The payloads stay in their slot until it
    /// is overwritten. A failed wakeup is logged and the entry still returned.
    pub fn dequeue(&mut self) -> Result<QueueEntry> {
        debug_assert!(!self.is_empty(), "dequeue on an empty queue");
        let head = self.head();
        let entry = QueueEntry {
            callback: self.callback(head)?,
            arg: self.arg(head)?,
        };

        let capacity = self.queue.capacity;
        let s = self.state_mut();
        s.head = (head + 1) % capacity;
        s.is_full = false;
        s.is_empty = s.head == s.tail;
        if let Err(e) = self.signal_not_full() {
            tracing::error!(queue_mutex = %self.queue.mutex, error = %e, "not_full signal failed");
        }
        Ok(entry)
    }
}

impl Drop for QueueAccess<'_> {
    fn drop(&mut self) {
        self.queue.mutex.set_guarded(false);
        if let Err(e) = self.queue.mutex.unlock() {
            tracing::error!(queue_mutex = %self.queue.mutex, error = %e, "queue unlock failed");
        }
    }
}
