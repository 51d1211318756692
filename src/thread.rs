// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Native OS threads with an integer exit status, joinable exactly once.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::identity::{Identity, Kind};
use crate::Payload;

/// Status recorded when a context fails to boot or run.
pub const CONTEXT_FAILURE: i32 = -1;

static NEXT_THREAD: AtomicU32 = AtomicU32::new(1);

/// The host runtime seam: boots a fresh execution context on the calling
/// thread and runs `program` in it with `arg` as its only input.
///
/// Implemented by the embedding runtime. The context is torn down before
/// `run` returns.
pub trait ContextHost: Send + 'static {
    type Error: fmt::Display;

    fn run(self, program: &str, arg: Payload) -> std::result::Result<(), Self::Error>;
}

/// Thread configuration. Unset fields use the platform defaults.
#[derive(Debug, Clone, Default)]
pub struct ThreadBuilder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl ThreadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name shown by debuggers and in panic messages.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Start a thread running `entry(arg)`. The value `entry` returns is the
    /// status reported by [`NativeThread::join`].
    pub fn start<F, A>(self, entry: F, arg: A) -> Result<NativeThread>
    where
        F: FnOnce(A) -> i32 + Send + 'static,
        A: Send + 'static,
    {
        let id = Identity::new(Kind::Thread, 0, NEXT_THREAD.fetch_add(1, Ordering::Relaxed));

        let mut builder = thread::Builder::new();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        let handle = builder
            .spawn(move || entry(arg))
            .map_err(Error::ThreadCreation)?;

        tracing::debug!(identity = %id, "thread started");
        Ok(NativeThread {
            id,
            handle: Some(handle),
        })
    }

    /// Start a thread that boots a context through `host` and runs `program`.
    /// Records 0 on success and [`CONTEXT_FAILURE`] if the host reports an error.
    pub fn start_context<H>(self, host: H, program: impl Into<String>, arg: Payload) -> Result<NativeThread>
    where
        H: ContextHost,
    {
        let program = program.into();
        self.start(
            move |(host, program, arg): (H, String, Payload)| match host.run(&program, arg) {
                Ok(()) => 0,
                Err(e) => {
                    tracing::error!(error = %e, "context failed");
                    CONTEXT_FAILURE
                }
            },
            (host, program, arg),
        )
    }
}

/// A running OS thread.
///
/// Joining consumes the handle, so a thread can only be joined once.
/// Dropping it without joining detaches the thread.
pub struct NativeThread {
    id: Identity,
    handle: Option<JoinHandle<i32>>,
}

impl NativeThread {
    /// Start `entry(arg)` on a new thread with default settings.
    pub fn start<F, A>(entry: F, arg: A) -> Result<Self>
    where
        F: FnOnce(A) -> i32 + Send + 'static,
        A: Send + 'static,
    {
        ThreadBuilder::new().start(entry, arg)
    }

    pub fn start_context<H>(host: H, program: impl Into<String>, arg: Payload) -> Result<Self>
    where
        H: ContextHost,
    {
        ThreadBuilder::new().start_context(host, program, arg)
    }

    /// Diagnostic token. Threads are not attachable.
    pub fn identity(&self) -> Identity {
        self.id
    }

    /// Whether the entry function has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Block until the entry function returns and hand back its status.
    pub fn join(mut self) -> Result<i32> {
        let Some(handle) = self.handle.take() else {
            unreachable!("join consumes the thread");
        };
        match handle.join() {
            Ok(status) => {
                tracing::debug!(identity = %self.id, status, "thread joined");
                Ok(status)
            }
            Err(panic) => Err(Error::Join(panic_message(&*panic))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("entry panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("entry panicked: {s}")
    } else {
        "entry panicked".to_string()
    }
}

impl Drop for NativeThread {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!(identity = %self.id, "thread detached without join");
        }
    }
}

impl fmt::Display for NativeThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread <{}>", self.id)
    }
}

impl fmt::Debug for NativeThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeThread")
            .field("identity", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
