//! Shared session state.
//!
//! One `SharedContext` exists per session, created before either thread
//! runs business logic and destroyed only after the engine thread has been
//! joined. Everything mutable that both threads touch — the ready flag, the
//! quit flag, the engine waker — lives behind a single mutex, so there is
//! exactly one lock order and a reader always sees a consistent view of
//! "is this session shutting down, and how do I nudge the engine".

use crate::message::{EngineMessage, UiMessage};
use crate::queue::Queue;
use crate::waker::EngineWaker;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct SessionFlags {
    ready: bool,
    quit: bool,
    waker: Option<Arc<dyn EngineWaker>>,
}

/// State shared by the engine and UI threads.
pub struct SharedContext {
    args: Vec<String>,
    ui_to_engine: Queue<UiMessage>,
    engine_to_ui: Queue<EngineMessage>,
    flags: Mutex<SessionFlags>,
    ready_cond: Condvar,
}

impl SharedContext {
    /// Create a context with the default queue capacity.
    pub fn new(args: Vec<String>) -> Self {
        Self::with_queue_capacity(args, crate::queue::DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a context with `capacity` slots per queue direction.
    pub fn with_queue_capacity(args: Vec<String>, capacity: usize) -> Self {
        Self {
            args,
            ui_to_engine: Queue::with_capacity(capacity),
            engine_to_ui: Queue::with_capacity(capacity),
            flags: Mutex::new(SessionFlags {
                ready: false,
                quit: false,
                waker: None,
            }),
            ready_cond: Condvar::new(),
        }
    }

    /// Process argument snapshot, read-only for the session lifetime.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The UI→engine command queue.
    pub fn ui_to_engine(&self) -> &Queue<UiMessage> {
        &self.ui_to_engine
    }

    /// The engine→UI reply queue.
    pub fn engine_to_ui(&self) -> &Queue<EngineMessage> {
        &self.engine_to_ui
    }

    fn lock(&self) -> MutexGuard<'_, SessionFlags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the engine thread has signalled readiness.
    ///
    /// Called by the UI thread during startup. Returns immediately if the
    /// signal already happened; there is no missed-signal race because the
    /// flag is checked under the same mutex the wait releases.
    pub fn wait_ready(&self) {
        let mut flags = self.lock();
        while !flags.ready {
            flags = self
                .ready_cond
                .wait(flags)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark startup complete and release any waiter.
    ///
    /// Called exactly once by the engine thread, even when startup fails —
    /// in the failure path the quit flag is set first, so the UI wakes into
    /// an orderly shutdown instead of hanging.
    pub fn signal_ready(&self) {
        let mut flags = self.lock();
        flags.ready = true;
        self.ready_cond.notify_all();
    }

    /// Whether a cooperative shutdown has been requested.
    pub fn quit_requested(&self) -> bool {
        self.lock().quit
    }

    /// Request a cooperative shutdown. Idempotent.
    pub fn request_quit(&self) {
        let mut flags = self.lock();
        if !flags.quit {
            debug!("session quit requested");
            flags.quit = true;
        }
    }

    /// Install or clear the engine waker.
    ///
    /// Set once by the engine thread after its event loop exists, cleared
    /// by the same thread before the loop is torn down.
    pub fn set_waker(&self, waker: Option<Arc<dyn EngineWaker>>) {
        self.lock().waker = waker;
    }

    /// Rouse the engine event loop, if it is installed.
    ///
    /// Returns `false` when no waker is present (engine not ready yet, or
    /// already stopped); callers simply skip waking in that case — the
    /// message stays queued and is drained on the next engine wake or not
    /// at all during shutdown.
    pub fn wake_engine(&self) -> bool {
        // Clone the handle out so the wake call runs outside the lock.
        let waker = self.lock().waker.clone();
        match waker {
            Some(waker) => {
                waker.wake();
                true
            }
            None => false,
        }
    }
}
