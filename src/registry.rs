// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Process-wide handle tables for shareable objects.
//
// Every mutex, condition and queue is stored in a per-kind registry slot
// together with an atomic reference count. Handles resolve identities through
// the registry, so a stale or forged identity fails closed instead of touching
// freed memory. The count is only decremented under the registry lock, which
// keeps a concurrent attach from resurrecting an object that is being torn
// down. The object itself is dropped after the lock has been released.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slab::Slab;

use crate::error::{Error, Result};
use crate::identity::{Identity, Kind, GEN_MASK};

/// A registered object plus its cross-handle reference count.
pub(crate) struct Shared<T> {
    value: T,
    refs: AtomicUsize,
}

impl<T> Shared<T> {
    pub(crate) fn get(&self) -> &T {
        &self.value
    }

    pub(crate) fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }
}

struct Entry<T> {
    generation: u32,
    shared: Arc<Shared<T>>,
}

struct Table<T> {
    slots: Slab<Entry<T>>,
    next_generation: u32,
}

impl<T> Table<T> {
    fn bump_generation(&mut self) -> u32 {
        self.next_generation = self.next_generation.wrapping_add(1) & GEN_MASK;
        if self.next_generation == 0 {
            self.next_generation = 1;
        }
        self.next_generation
    }

    fn lookup(&self, id: Identity) -> Option<&Entry<T>> {
        self.slots
            .get(id.index() as usize)
            .filter(|e| e.generation == id.generation())
    }
}

pub(crate) struct Registry<T> {
    kind: Kind,
    table: Mutex<Table<T>>,
}

impl<T> Registry<T> {
    pub(crate) fn new(kind: Kind) -> Self {
        Self {
            kind,
            table: Mutex::new(Table {
                slots: Slab::new(),
                next_generation: 0,
            }),
        }
    }

    fn table(&self) -> MutexGuard<'_, Table<T>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invalid(&self, id: Identity) -> Error {
        Error::InvalidIdentity {
            identity: id,
            expected: self.kind,
        }
    }

    /// Register a fresh object with a reference count of 1.
    pub(crate) fn insert(&self, value: T) -> Result<(Identity, Arc<Shared<T>>)> {
        let shared = Arc::new(Shared {
            value,
            refs: AtomicUsize::new(1),
        });
        let mut table = self.table();
        let generation = table.bump_generation();
        let entry = table.slots.vacant_entry();
        let index = u32::try_from(entry.key()).map_err(|_| {
            Error::ResourceExhausted(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "handle table is full",
            ))
        })?;
        entry.insert(Entry {
            generation,
            shared: Arc::clone(&shared),
        });
        Ok((Identity::new(self.kind, generation, index), shared))
    }

    /// Resolve `id` and take one more reference on it.
    pub(crate) fn attach(&self, id: Identity) -> Result<Arc<Shared<T>>> {
        if id.kind() != Some(self.kind) {
            return Err(self.invalid(id));
        }
        let table = self.table();
        let entry = table.lookup(id).ok_or_else(|| self.invalid(id))?;
        entry.shared.refs.fetch_add(1, Ordering::AcqRel);
        Ok(Arc::clone(&entry.shared))
    }

    /// Drop one reference. Returns the object on the 1 -> 0 transition so the
    /// caller destroys it outside the registry lock.
    pub(crate) fn release(&self, id: Identity) -> Option<Arc<Shared<T>>> {
        let mut table = self.table();
        let last = table.lookup(id)?.shared.refs.fetch_sub(1, Ordering::AcqRel) == 1;
        if last {
            Some(table.slots.remove(id.index() as usize).shared)
        } else {
            None
        }
    }

    pub(crate) fn contains(&self, id: Identity) -> bool {
        id.kind() == Some(self.kind) && self.table().lookup(id).is_some()
    }

    /// Number of live objects of this kind.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table().slots.len()
    }
}

/// A type stored in a process-wide registry.
pub(crate) trait Registered: Sized + Send + Sync + 'static {
    const KIND: Kind;

    fn registry() -> &'static Registry<Self>;
}

/// One counted reference to a registered object. Dropping it releases.
pub(crate) struct Handle<T: Registered> {
    id: Identity,
    shared: Arc<Shared<T>>,
}

impl<T: Registered> Handle<T> {
    pub(crate) fn create(value: T) -> Result<Self> {
        let (id, shared) = T::registry().insert(value)?;
        tracing::debug!(kind = %T::KIND, identity = %id, "created");
        Ok(Self { id, shared })
    }

    pub(crate) fn attach(id: Identity) -> Result<Self> {
        let shared = T::registry().attach(id)?;
        tracing::debug!(kind = %T::KIND, identity = %id, refs = shared.ref_count(), "attached");
        Ok(Self { id, shared })
    }

    pub(crate) fn is_live(id: Identity) -> bool {
        T::registry().contains(id)
    }

    pub(crate) fn identity(&self) -> Identity {
        self.id
    }

    pub(crate) fn ref_count(&self) -> usize {
        self.shared.ref_count()
    }

    pub(crate) fn get(&self) -> &T {
        self.shared.get()
    }
}

impl<T: Registered> Clone for Handle<T> {
    fn clone(&self) -> Self {
        // Holding `self` keeps the count above zero, so no registry lock is needed.
        self.shared.refs.fetch_add(1, Ordering::AcqRel);
        Self {
            id: self.id,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Registered> Drop for Handle<T> {
    fn drop(&mut self) {
        match T::registry().release(self.id) {
            Some(last) => {
                tracing::debug!(kind = %T::KIND, identity = %self.id, "destroying");
                drop(last);
            }
            None => tracing::trace!(kind = %T::KIND, identity = %self.id, "released"),
        }
    }
}
