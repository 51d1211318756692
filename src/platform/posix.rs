// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX implementation of the in-process mutex and condition variable.
// Both live in their own heap allocation so the pthread object never moves
// after initialisation.

use std::cell::UnsafeCell;
use std::io;
use std::ptr;

fn check(eno: libc::c_int) -> io::Result<()> {
    if eno != 0 {
        return Err(io::Error::from_raw_os_error(eno));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PlatformMutex: error-checking pthread_mutex_t
// ---------------------------------------------------------------------------

pub struct PlatformMutex {
    raw: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

// Safety: pthread mutexes are designed for concurrent access and the
// allocation never moves.
unsafe impl Send for PlatformMutex {}
unsafe impl Sync for PlatformMutex {}

impl PlatformMutex {
    /// Initialise a fresh mutex with `PTHREAD_MUTEX_ERRORCHECK`, so relocking
    /// from the owner or unlocking from a non-owner is reported instead of
    /// deadlocking or corrupting state.
    pub fn new() -> io::Result<Self> {
        let raw: Box<UnsafeCell<libc::pthread_mutex_t>> =
            Box::new(UnsafeCell::new(unsafe { std::mem::zeroed() }));
        unsafe {
            let mut attr: libc::pthread_mutexattr_t = std::mem::zeroed();
            check(libc::pthread_mutexattr_init(&mut attr))?;

            let eno = libc::pthread_mutexattr_settype(&mut attr, libc::PTHREAD_MUTEX_ERRORCHECK);
            if eno != 0 {
                libc::pthread_mutexattr_destroy(&mut attr);
                return Err(io::Error::from_raw_os_error(eno));
            }

            let eno = libc::pthread_mutex_init(raw.get(), &attr);
            libc::pthread_mutexattr_destroy(&mut attr);
            check(eno)?;
        }
        Ok(Self { raw })
    }

    pub(crate) fn native_ptr(&self) -> *mut libc::pthread_mutex_t {
        self.raw.get()
    }

    /// Lock the mutex (blocking).
    pub fn lock(&self) -> io::Result<()> {
        check(unsafe { libc::pthread_mutex_lock(self.native_ptr()) })
    }

    /// Returns `Ok(false)` if another thread holds the mutex.
    pub fn try_lock(&self) -> io::Result<bool> {
        match unsafe { libc::pthread_mutex_trylock(self.native_ptr()) } {
            0 => Ok(true),
            libc::EBUSY => Ok(false),
            eno => Err(io::Error::from_raw_os_error(eno)),
        }
    }

    pub fn unlock(&self) -> io::Result<()> {
        check(unsafe { libc::pthread_mutex_unlock(self.native_ptr()) })
    }
}

impl Drop for PlatformMutex {
    fn drop(&mut self) {
        // Best effort: EBUSY from a still-locked mutex is not reported.
        unsafe { libc::pthread_mutex_destroy(self.native_ptr()) };
    }
}

// ---------------------------------------------------------------------------
// PlatformCondition: pthread_cond_t
// ---------------------------------------------------------------------------

pub struct PlatformCondition {
    raw: Box<UnsafeCell<libc::pthread_cond_t>>,
}

unsafe impl Send for PlatformCondition {}
unsafe impl Sync for PlatformCondition {}

impl PlatformCondition {
    pub fn new() -> io::Result<Self> {
        let raw: Box<UnsafeCell<libc::pthread_cond_t>> =
            Box::new(UnsafeCell::new(unsafe { std::mem::zeroed() }));
        check(unsafe { libc::pthread_cond_init(raw.get(), ptr::null()) })?;
        Ok(Self { raw })
    }

    fn cond_ptr(&self) -> *mut libc::pthread_cond_t {
        self.raw.get()
    }

    /// Atomically release `mtx`, sleep until signalled, then reacquire `mtx`.
    /// The caller must hold `mtx`.
    pub fn wait(&self, mtx: &PlatformMutex) -> io::Result<()> {
        check(unsafe { libc::pthread_cond_wait(self.cond_ptr(), mtx.native_ptr()) })
    }

    /// Wake one waiter.
    pub fn signal(&self) -> io::Result<()> {
        check(unsafe { libc::pthread_cond_signal(self.cond_ptr()) })
    }

    /// Wake all waiters.
    pub fn broadcast(&self) -> io::Result<()> {
        check(unsafe { libc::pthread_cond_broadcast(self.cond_ptr()) })
    }
}

impl Drop for PlatformCondition {
    fn drop(&mut self) {
        unsafe { libc::pthread_cond_destroy(self.cond_ptr()) };
    }
}
