// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Windows implementation of the in-process mutex and condition variable.
// SRW locks do not report misuse, so the owning thread id is tracked to give
// the same error-checking behaviour as the POSIX backend.

use std::cell::UnsafeCell;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};

use windows_sys::Win32::Foundation::{ERROR_NOT_OWNER, ERROR_POSSIBLE_DEADLOCK};
use windows_sys::Win32::System::Threading::{
    AcquireSRWLockExclusive, GetCurrentThreadId, ReleaseSRWLockExclusive,
    SleepConditionVariableSRW, TryAcquireSRWLockExclusive, WakeAllConditionVariable,
    WakeConditionVariable, CONDITION_VARIABLE, CONDITION_VARIABLE_INIT, INFINITE, SRWLOCK,
    SRWLOCK_INIT,
};

fn os_error(code: u32) -> io::Error {
    io::Error::from_raw_os_error(code as i32)
}

// ---------------------------------------------------------------------------
// PlatformMutex: SRW lock in exclusive mode
// ---------------------------------------------------------------------------

pub struct PlatformMutex {
    raw: Box<UnsafeCell<SRWLOCK>>,
    owner: AtomicU32, // 0 = unowned; Windows never hands out thread id 0
}

unsafe impl Send for PlatformMutex {}
unsafe impl Sync for PlatformMutex {}

impl PlatformMutex {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            raw: Box::new(UnsafeCell::new(SRWLOCK_INIT)),
            owner: AtomicU32::new(0),
        })
    }

    fn lock_ptr(&self) -> *mut SRWLOCK {
        self.raw.get()
    }

    fn held_by_caller(&self) -> bool {
        self.owner.load(Ordering::Acquire) == unsafe { GetCurrentThreadId() }
    }

    pub fn lock(&self) -> io::Result<()> {
        if self.held_by_caller() {
            return Err(os_error(ERROR_POSSIBLE_DEADLOCK));
        }
        unsafe { AcquireSRWLockExclusive(self.lock_ptr()) };
        self.owner
            .store(unsafe { GetCurrentThreadId() }, Ordering::Release);
        Ok(())
    }

    pub fn try_lock(&self) -> io::Result<bool> {
        if self.held_by_caller() {
            return Ok(false);
        }
        if unsafe { TryAcquireSRWLockExclusive(self.lock_ptr()) } == 0 {
            return Ok(false);
        }
        self.owner
            .store(unsafe { GetCurrentThreadId() }, Ordering::Release);
        Ok(true)
    }

    pub fn unlock(&self) -> io::Result<()> {
        if !self.held_by_caller() {
            return Err(os_error(ERROR_NOT_OWNER));
        }
        self.owner.store(0, Ordering::Release);
        unsafe { ReleaseSRWLockExclusive(self.lock_ptr()) };
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PlatformCondition: CONDITION_VARIABLE paired with the SRW lock above
// ---------------------------------------------------------------------------

pub struct PlatformCondition {
    raw: Box<UnsafeCell<CONDITION_VARIABLE>>,
}

unsafe impl Send for PlatformCondition {}
unsafe impl Sync for PlatformCondition {}

impl PlatformCondition {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            raw: Box::new(UnsafeCell::new(CONDITION_VARIABLE_INIT)),
        })
    }

    fn cond_ptr(&self) -> *mut CONDITION_VARIABLE {
        self.raw.get()
    }

    /// Atomically release `mtx`, sleep until signalled, then reacquire `mtx`.
    pub fn wait(&self, mtx: &PlatformMutex) -> io::Result<()> {
        if !mtx.held_by_caller() {
            return Err(os_error(ERROR_NOT_OWNER));
        }
        mtx.owner.store(0, Ordering::Release);
        let ok = unsafe { SleepConditionVariableSRW(self.cond_ptr(), mtx.lock_ptr(), INFINITE, 0) };
        // The lock is held again whether or not the sleep succeeded.
        mtx.owner
            .store(unsafe { GetCurrentThreadId() }, Ordering::Release);
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn signal(&self) -> io::Result<()> {
        unsafe { WakeConditionVariable(self.cond_ptr()) };
        Ok(())
    }

    pub fn broadcast(&self) -> io::Result<()> {
        unsafe { WakeAllConditionVariable(self.cond_ptr()) };
        Ok(())
    }
}
