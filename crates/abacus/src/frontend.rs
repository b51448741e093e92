//! The seam between the session loop and the window/input toolkit.

use abacus_ui::{Console, PaneRenderer};
use std::io;
use std::time::Duration;

/// Input produced by one frontend poll.
#[derive(Debug, PartialEq, Eq)]
pub enum FrontendEvent {
    /// The user submitted an expression for evaluation.
    Submit(String),
    /// The user asked to close the session (window close, Ctrl-C, Esc).
    CloseRequested,
}

/// A window/input backend.
///
/// One poll per frame, bounded by `timeout` so the UI thread stays
/// responsive to OS input even when no cross-thread messages are pending.
/// The console is passed in for input-history navigation; implementations
/// must not block past the timeout.
///
/// Rendering goes through the [`PaneRenderer`] supertrait: the registry
/// dispatches every open pane to it after each pump.
pub trait Frontend: PaneRenderer {
    /// Wait up to `timeout` for user input.
    fn poll(&mut self, console: &mut Console, timeout: Duration)
    -> io::Result<Option<FrontendEvent>>;
}
