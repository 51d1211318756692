// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Shareable, reference-counted mutex.
// Delegates to platform::PlatformMutex (POSIX or Windows).

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::identity::{Identity, Kind};
use crate::platform::PlatformMutex;
use crate::registry::{Handle, Registered, Registry};

/// The registered object behind every [`SharedMutex`] handle.
///
/// `guarded` is set while a [`crate::QueueAccess`] owns the lock. It is only
/// written by the thread holding the mutex.
pub(crate) struct MutexCell {
    raw: PlatformMutex,
    guarded: AtomicBool,
}

impl Registered for MutexCell {
    const KIND: Kind = Kind::Mutex;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<MutexCell>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Kind::Mutex))
    }
}

pub(crate) fn guarded_error() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "mutex is held by a queue guard")
}

/// A mutual-exclusion lock that other contexts can attach to by identity.
///
/// Every `create`, `attach` and `clone` takes one reference; every `release`
/// (or drop) gives one back. The OS mutex is destroyed exactly when the last
/// reference is released. The lock is not reentrant: relocking from the
/// owning thread fails with [`Error::Lock`] rather than deadlocking.
///
/// Locking and unlocking are separate calls so the mutex can be held across
/// a condition wait. Pair every successful `lock` with `unlock` from the same
/// thread. A mutex embedded in a [`crate::BoundedQueue`] cannot be unlocked
/// through this handle while a [`crate::QueueAccess`] guard holds it.
pub struct SharedMutex {
    handle: Handle<MutexCell>,
}

impl SharedMutex {
    /// Allocate a fresh OS mutex with a reference count of 1.
    pub fn create() -> Result<Self> {
        let raw = PlatformMutex::new().map_err(Error::ResourceExhausted)?;
        let cell = MutexCell {
            raw,
            guarded: AtomicBool::new(false),
        };
        Ok(Self {
            handle: Handle::create(cell)?,
        })
    }

    /// Take a new reference on the mutex named by `id`.
    ///
    /// Fails with [`Error::InvalidIdentity`] if `id` does not name a live mutex.
    pub fn attach(id: Identity) -> Result<Self> {
        Ok(Self {
            handle: Handle::attach(id)?,
        })
    }

    /// Whether `id` still names a live mutex.
    pub fn is_live(id: Identity) -> bool {
        Handle::<MutexCell>::is_live(id)
    }

    /// The token other contexts pass to [`SharedMutex::attach`].
    pub fn identity(&self) -> Identity {
        self.handle.identity()
    }

    /// Number of live references across all handles.
    pub fn ref_count(&self) -> usize {
        self.handle.ref_count()
    }

    /// Block until the mutex is acquired.
    pub fn lock(&self) -> Result<()> {
        self.platform().lock().map_err(Error::Lock)
    }

    /// Acquire the mutex if it is free. Returns `Ok(false)` if it is held.
    pub fn try_lock(&self) -> Result<bool> {
        self.platform().try_lock().map_err(Error::Lock)
    }

    /// Release the mutex. Fails with [`Error::Unlock`] if the calling thread
    /// does not hold it, or if a queue guard does.
    pub fn unlock(&self) -> Result<()> {
        if self.is_guarded() {
            return Err(Error::Unlock(guarded_error()));
        }
        self.platform().unlock().map_err(Error::Unlock)
    }

    /// Give back this handle's reference. Same as dropping it.
    pub fn release(self) {}

    pub(crate) fn platform(&self) -> &PlatformMutex {
        &self.handle.get().raw
    }

    pub(crate) fn is_guarded(&self) -> bool {
        self.handle.get().guarded.load(Ordering::Acquire)
    }

    /// Mark the held mutex as owned by a queue guard, or hand it back.
    /// Caller must hold the lock.
    pub(crate) fn set_guarded(&self, guarded: bool) {
        self.handle.get().guarded.store(guarded, Ordering::Release);
    }
}

impl Clone for SharedMutex {
    /// Attach another handle to the same mutex.
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl fmt::Display for SharedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mutex <{}>", self.identity())
    }
}

impl fmt::Debug for SharedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMutex")
            .field("identity", &self.identity())
            .field("refs", &self.ref_count())
            .finish()
    }
}
