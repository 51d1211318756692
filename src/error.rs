// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy shared by every primitive in the crate.
// OS failures keep the raw errno as an `io::Error` source.

use std::io;

use thiserror::Error;

use crate::identity::{Identity, Kind};

/// Errors reported by threads, mutexes, conditions and queues.
///
/// Construction failures leave nothing behind: every partially created
/// resource is released before the error is returned. Runtime failures are
/// reported to the immediate caller and never retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS or the allocator could not provide a resource during construction.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(#[source] io::Error),

    /// The OS refused to start a new thread.
    #[error("thread creation failed: {0}")]
    ThreadCreation(#[source] io::Error),

    /// Waiting for a thread to finish failed.
    #[error("thread join failed: {0}")]
    Join(String),

    #[error("mutex lock failed: {0}")]
    Lock(#[source] io::Error),

    #[error("mutex unlock failed: {0}")]
    Unlock(#[source] io::Error),

    #[error("condition signal failed: {0}")]
    Signal(#[source] io::Error),

    #[error("condition wait failed: {0}")]
    Wait(#[source] io::Error),

    /// A slot index or protocol cursor outside `[0, capacity)`.
    #[error("index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },

    /// An attach token that does not name a live object of the expected kind.
    #[error("identity {identity} does not refer to a live {expected}")]
    InvalidIdentity { identity: Identity, expected: Kind },

    /// A queue must hold at least one slot.
    #[error("invalid queue capacity: {0}")]
    InvalidCapacity(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
