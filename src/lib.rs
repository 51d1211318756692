// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Native threads, shareable mutexes and condition variables, and a bounded
// blocking queue for coordinating isolated execution contexts inside one
// process. Mutexes, conditions and queues are shared between contexts by
// passing an integer identity and attaching to it.

mod error;
pub use error::{Error, Result};

mod identity;
pub use identity::{Identity, Kind};

mod platform;
mod registry;

mod mutex;
pub use mutex::SharedMutex;

mod condition;
pub use condition::SharedCondition;

mod thread;
pub use thread::{ContextHost, NativeThread, ThreadBuilder, CONTEXT_FAILURE};

mod payload;
pub use payload::Payload;

mod queue;
pub use queue::{BoundedQueue, QueueAccess, QueueEntry};
