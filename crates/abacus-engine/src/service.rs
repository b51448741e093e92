//! Engine thread lifecycle: startup, event loop, teardown.
//!
//! Startup order matters and mirrors the shutdown invariants: the runtime
//! and stores are built first, the optional script preloaded, the waker
//! installed, and only then is readiness signalled. On any startup failure
//! the quit flag is set *before* readiness, so the UI thread wakes into an
//! orderly abort instead of hanging in `wait_ready`.

use crate::eval::Interpreter;
use crate::store::ValueStore;
use crate::widget::WidgetTable;
use abacus_bridge::{EngineWaker, SharedContext};
use std::io;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// The engine thread's working state: runtime, exported values, widgets.
///
/// Owned by the engine thread; the only handle other threads hold is the
/// [`SharedContext`] inside.
pub struct EngineService {
    pub(crate) ctx: Arc<SharedContext>,
    pub(crate) interp: Interpreter,
    pub(crate) store: ValueStore,
    pub(crate) widgets: WidgetTable,
}

impl EngineService {
    /// Build a service around a shared context.
    pub fn new(ctx: Arc<SharedContext>) -> Self {
        Self {
            ctx,
            interp: Interpreter::new(),
            store: ValueStore::new(),
            widgets: WidgetTable::new(),
        }
    }

    /// The exported-value store, for disposal accounting in tests.
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// The engine widget table.
    pub fn widgets(&self) -> &WidgetTable {
        &self.widgets
    }

    /// Evaluate a preload script, one expression per line.
    ///
    /// Blank lines and `/`-comments are skipped. Evaluation errors are
    /// reported to the console and do not stop the preload; only a failure
    /// to read the file is a startup error.
    pub fn preload_script(&mut self, path: &Path) -> io::Result<()> {
        let source = std::fs::read_to_string(path)?;
        info!(path = %path.display(), "preloading script");
        for (lineno, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('/') {
                continue;
            }
            if let Err(err) = self.eval_line(line) {
                warn!(line = lineno + 1, %err, "preload expression failed");
                self.report_error(format!("{}:{}: {err}", path.display(), lineno + 1));
            }
        }
        Ok(())
    }
}

/// Condvar-parked waker for the engine event loop.
///
/// `wake` sets a pending flag under the same mutex `wait` sleeps on, so a
/// wake that lands between a drain and the following wait is never lost.
pub struct LoopWaker {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl LoopWaker {
    /// Create a waker with no pending wake.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Block until a wake arrives (or has already arrived), consuming it.
    pub fn wait(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while !*pending {
            pending = self
                .cond
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *pending = false;
    }
}

impl Default for LoopWaker {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineWaker for LoopWaker {
    fn wake(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.cond.notify_one();
    }
}

/// Spawn the engine thread.
///
/// The caller must `wait_ready` on the context afterwards and then check
/// the quit flag: quit-at-ready means startup failed and the session
/// should abort instead of entering its frame loop.
pub fn spawn(ctx: Arc<SharedContext>) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("abacus-engine".into())
        .spawn(move || run(ctx))
}

/// Engine thread body.
pub fn run(ctx: Arc<SharedContext>) {
    let mut service = EngineService::new(Arc::clone(&ctx));

    // args[0] is the program name; args[1], when present, is a script to
    // preload before the session opens.
    let script = ctx.args().get(1).map(Path::new).map(Path::to_path_buf);
    if let Some(path) = script {
        if let Err(err) = service.preload_script(&path) {
            error!(path = %path.display(), %err, "engine startup failed");
            // Quit first, ready second: the UI must never hang waiting
            // for a runtime that failed to start.
            ctx.request_quit();
            ctx.signal_ready();
            return;
        }
    }

    let waker = Arc::new(LoopWaker::new());
    ctx.set_waker(Some(waker.clone()));
    ctx.signal_ready();
    info!("engine ready");

    loop {
        service.drain();
        if ctx.quit_requested() {
            break;
        }
        waker.wait();
    }

    // The loop is gone; a wake from here on must become a no-op.
    ctx.set_waker(None);
    debug!(
        live_values = service.store().live_values(),
        widgets = service.widgets().len(),
        "engine loop stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wake_before_wait_is_not_lost() {
        let waker = LoopWaker::new();
        waker.wake();
        // Must return immediately: the flag was set before the wait.
        waker.wait();
    }

    #[test]
    fn wait_blocks_until_woken() {
        let waker = Arc::new(LoopWaker::new());
        let waiter = {
            let waker = Arc::clone(&waker);
            thread::spawn(move || waker.wait())
        };
        thread::sleep(Duration::from_millis(20));
        waker.wake();
        waiter.join().unwrap();
    }

    #[test]
    fn startup_failure_sets_quit_then_ready() {
        let ctx = Arc::new(SharedContext::new(vec![
            "abacus".into(),
            "/nonexistent/definitely-missing.ab".into(),
        ]));
        let handle = spawn(Arc::clone(&ctx)).unwrap();
        // Must not hang even though startup failed.
        ctx.wait_ready();
        assert!(ctx.quit_requested());
        handle.join().unwrap();
    }

    #[test]
    fn quit_plus_wake_stops_the_loop() {
        let ctx = Arc::new(SharedContext::new(vec![]));
        let handle = spawn(Arc::clone(&ctx)).unwrap();
        ctx.wait_ready();
        assert!(!ctx.quit_requested());
        ctx.request_quit();
        ctx.wake_engine();
        handle.join().unwrap();
        // Waker was cleared on the way out.
        assert!(!ctx.wake_engine());
    }
}
