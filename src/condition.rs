// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Shareable, reference-counted condition variable.
// POSIX: pthread_cond_t. Windows: CONDITION_VARIABLE over an SRW lock.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::identity::{Identity, Kind};
use crate::platform::PlatformCondition;
use crate::registry::{Handle, Registered, Registry};
use crate::mutex::guarded_error;
use crate::SharedMutex;

impl Registered for PlatformCondition {
    const KIND: Kind = Kind::Condition;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<PlatformCondition>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Kind::Condition))
    }
}

/// A condition variable with the same create/attach/release contract as
/// [`SharedMutex`]. Always waited on together with a mutex.
pub struct SharedCondition {
    handle: Handle<PlatformCondition>,
}

impl SharedCondition {
    pub fn create() -> Result<Self> {
        let cond = PlatformCondition::new().map_err(Error::ResourceExhausted)?;
        Ok(Self {
            handle: Handle::create(cond)?,
        })
    }

    pub fn attach(id: Identity) -> Result<Self> {
        Ok(Self {
            handle: Handle::attach(id)?,
        })
    }

    pub fn is_live(id: Identity) -> bool {
        Handle::<PlatformCondition>::is_live(id)
    }

    pub fn identity(&self) -> Identity {
        self.handle.identity()
    }

    pub fn ref_count(&self) -> usize {
        self.handle.ref_count()
    }

    /// Wake one waiter.
    ///
    /// Exactly one thread is woken if any are waiting. Waiters must still
    /// loop on their predicate since wakeups may be spurious.
    pub fn signal(&self) -> Result<()> {
        self.handle.get().signal().map_err(Error::Signal)
    }

    /// Wake all waiters.
    pub fn broadcast(&self) -> Result<()> {
        self.handle.get().broadcast().map_err(Error::Signal)
    }

    /// Wait on the condition variable. The caller must hold `mtx` locked.
    /// The mutex is atomically released and re-acquired around the wait.
    ///
    /// Fails with [`Error::Wait`] if `mtx` is held by a queue guard; such
    /// waits go through the guard.
    pub fn wait(&self, mtx: &SharedMutex) -> Result<()> {
        if mtx.is_guarded() {
            return Err(Error::Wait(guarded_error()));
        }
        self.wait_raw(mtx)
    }

    /// Wait while a queue guard owns `mtx`. The guard flag is dropped for the
    /// duration of the wait and restored once the lock is re-acquired.
    pub(crate) fn wait_guarded(&self, mtx: &SharedMutex) -> Result<()> {
        mtx.set_guarded(false);
        let res = self.wait_raw(mtx);
        mtx.set_guarded(true);
        res
    }

    fn wait_raw(&self, mtx: &SharedMutex) -> Result<()> {
        self.handle.get().wait(mtx.platform()).map_err(Error::Wait)
    }

    /// Wait until `pred` returns `false`. The caller must hold `mtx` locked.
    pub fn wait_while<F>(&self, mtx: &SharedMutex, mut pred: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        while pred() {
            self.wait(mtx)?;
        }
        Ok(())
    }

    pub fn release(self) {}
}

impl Clone for SharedCondition {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl fmt::Display for SharedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition <{}>", self.identity())
    }
}

impl fmt::Debug for SharedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCondition")
            .field("identity", &self.identity())
            .field("refs", &self.ref_count())
            .finish()
    }
}
