//! Session orchestration: spawn, handshake, frame loop, shutdown.
//!
//! The session as a whole moves through
//! `Starting → Ready → Running → Draining → Stopped`. The Starting→Ready
//! edge is the ready handshake; Running→Draining is triggered by a close
//! request, a frontend failure, or an engine-side quit; Draining→Stopped
//! requires the engine thread to be joined before the shared context is
//! dropped — nothing may touch the bridge after Stopped.

use crate::frontend::{Frontend, FrontendEvent};
use abacus_bridge::{ConsoleLine, SharedContext, UiMessage, WidgetKind};
use abacus_ui::{Console, PaneState, UiWidget, WidgetRegistry, install_console, pump_frame};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-frame input wait; keeps the UI responsive without busy-polling.
const FRAME_TIMEOUT: Duration = Duration::from_millis(16);

/// Errors that abort a session.
#[derive(Debug)]
pub enum SessionError {
    /// The engine thread could not be spawned.
    Spawn(io::Error),
    /// The engine signalled ready with quit already set: its runtime
    /// failed to start.
    EngineStartup,
    /// The frontend failed to poll or draw.
    Frontend(io::Error),
    /// The built-in console pane disappeared from the registry.
    ConsolePaneMissing,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Spawn(e) => write!(f, "failed to spawn engine thread: {e}"),
            SessionError::EngineStartup => write!(f, "engine failed to start"),
            SessionError::Frontend(e) => write!(f, "frontend error: {e}"),
            SessionError::ConsolePaneMissing => write!(f, "console pane missing"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Spawn(e) | SessionError::Frontend(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Starting,
    Ready,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Running => "running",
            SessionState::Draining => "draining",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Run a full session on the calling thread (which becomes the UI
/// thread), spawning and joining the engine thread internally.
///
/// `args[0]` is the program name; `args[1]`, when present, names a script
/// the engine preloads before the handshake completes.
pub fn run<F: Frontend>(args: Vec<String>, frontend: &mut F) -> Result<(), SessionError> {
    let mut state = SessionState::Starting;
    let ctx = Arc::new(SharedContext::new(args));

    let engine = abacus_engine::spawn(Arc::clone(&ctx)).map_err(SessionError::Spawn)?;
    ctx.wait_ready();
    if ctx.quit_requested() {
        // Startup failed engine-side; it has already returned.
        if engine.join().is_err() {
            warn!("engine thread panicked during failed startup");
        }
        return Err(SessionError::EngineStartup);
    }
    transition(&mut state, SessionState::Ready);

    let mut registry = WidgetRegistry::new();
    install_console(&mut registry);
    transition(&mut state, SessionState::Running);

    let mut frame_error = None;
    loop {
        if ctx.quit_requested() {
            debug!("engine requested quit");
            break;
        }

        let Some(console) = console_mut(&mut registry) else {
            frame_error = Some(SessionError::ConsolePaneMissing);
            break;
        };
        match frontend.poll(console, FRAME_TIMEOUT) {
            Ok(Some(FrontendEvent::Submit(line))) => submit(&ctx, &mut registry, line),
            Ok(Some(FrontendEvent::CloseRequested)) => break,
            Ok(None) => {}
            Err(err) => {
                frame_error = Some(SessionError::Frontend(err));
                break;
            }
        }

        pump_frame(&ctx, &mut registry);
        registry.render(frontend);
    }

    transition(&mut state, SessionState::Draining);
    ctx.request_quit();
    // Belt and braces: the flag alone stops the pump, the message covers
    // an engine blocked before its next flag check, the wake covers an
    // idle engine. A full queue is fine — the flag is already set.
    if let Err(rejected) = ctx.ui_to_engine().push(UiMessage::Quit) {
        debug!("quit command not queued ({rejected}), relying on the flag");
    }
    ctx.wake_engine();
    if engine.join().is_err() {
        // Proceed anyway: holding process resources hostage to a clean
        // join is worse than a noisy shutdown.
        warn!("engine thread panicked; continuing shutdown");
    }
    registry.destroy_all();
    transition(&mut state, SessionState::Stopped);

    match frame_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn transition(state: &mut SessionState, to: SessionState) {
    debug!(from = %state, to = %to, "session state");
    *state = to;
}

fn console_mut(registry: &mut WidgetRegistry) -> Option<&mut Console> {
    let pane = registry.find_by_kind(WidgetKind::Console)?;
    match &mut pane.state {
        PaneState::Console(console) => Some(console),
        _ => None,
    }
}

/// Echo, record, and dispatch one submitted line. Lines starting with a
/// backslash are console commands handled here; everything else goes to
/// the engine for evaluation.
fn submit(ctx: &SharedContext, registry: &mut WidgetRegistry, line: String) {
    if line.trim().is_empty() {
        return;
    }
    registry.console_push(ConsoleLine::echo(line.clone()));
    if let Some(console) = console_mut(registry) {
        console.record_input(&line);
    }
    if let Some(cmd) = line.trim().strip_prefix('\\') {
        handle_command(ctx, registry, cmd);
        return;
    }
    send_command(ctx, registry, UiMessage::Evaluate { expr: line });
}

/// Push a command to the engine, wake it, and report a full queue to the
/// console.
fn send_command(ctx: &SharedContext, registry: &mut WidgetRegistry, msg: UiMessage) {
    match ctx.ui_to_engine().push(msg) {
        Ok(()) => {
            if !ctx.wake_engine() {
                debug!("engine waker not installed; command stays queued");
            }
        }
        Err(_) => {
            warn!("command queue full, input dropped");
            registry.console_push(ConsoleLine::error("command queue full, try again"));
        }
    }
}

/// Console commands:
///
/// - `\filter NAME EXPR` installs `EXPR` as the named widget's
///   post-filter; `\filter NAME` clears it.
/// - `\close NAME` removes the named pane, returning its render data to
///   the engine for disposal.
fn handle_command(ctx: &SharedContext, registry: &mut WidgetRegistry, cmd: &str) {
    let mut parts = cmd.splitn(3, char::is_whitespace);
    match (parts.next(), parts.next(), parts.next()) {
        (Some("filter"), Some(name), expr) => {
            let Some(widget) = registry.find_by_name(name).map(UiWidget::id) else {
                registry.console_push(ConsoleLine::error(format!("no widget named {name}")));
                return;
            };
            let expr = expr.map(str::to_string);
            send_command(ctx, registry, UiMessage::SetPostFilter { widget, expr });
        }
        (Some("close"), Some(name), None) => {
            let Some((id, kind)) = registry.find_by_name(name).map(|p| (p.id(), p.kind())) else {
                registry.console_push(ConsoleLine::error(format!("no widget named {name}")));
                return;
            };
            if kind == WidgetKind::Console {
                registry.console_push(ConsoleLine::error("cannot close the console"));
                return;
            }
            if let Some(mut removed) = registry.remove(id)
                && let Some(value) = removed.take_render_data()
            {
                // Same rule as the frame pump: the handle goes back for
                // engine-side disposal, never freed from here.
                send_command(ctx, registry, UiMessage::Drop { value });
            }
        }
        _ => {
            registry.console_push(ConsoleLine::error(format!("unknown command: \\{cmd}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abacus_bridge::{ConsoleTag, ValueHandle, WidgetId};
    use abacus_ui::PaneRenderer;

    /// Frontend that replays scripted events and snapshots the console
    /// every time it renders it.
    struct ScriptedFrontend {
        events: Vec<Option<FrontendEvent>>,
        at: usize,
        console_seen: Vec<(ConsoleTag, String)>,
    }

    impl ScriptedFrontend {
        fn new(events: Vec<Option<FrontendEvent>>) -> Self {
            Self {
                events,
                at: 0,
                console_seen: Vec::new(),
            }
        }
    }

    impl PaneRenderer for ScriptedFrontend {
        fn table(&mut self, _pane: &mut UiWidget) {}
        fn chart(&mut self, _pane: &mut UiWidget) {}
        fn text(&mut self, _pane: &mut UiWidget) {}
        fn console(&mut self, pane: &mut UiWidget) {
            if let PaneState::Console(console) = &pane.state {
                self.console_seen = console
                    .lines()
                    .map(|l| (l.tag, l.text.clone()))
                    .collect();
            }
        }
    }

    impl Frontend for ScriptedFrontend {
        fn poll(
            &mut self,
            _console: &mut Console,
            timeout: Duration,
        ) -> io::Result<Option<FrontendEvent>> {
            // Past the script's end, keep asking to close.
            if self.at >= self.events.len() {
                return Ok(Some(FrontendEvent::CloseRequested));
            }
            let event = self.events[self.at].take();
            self.at += 1;
            if event.is_none() {
                // Honor the contract: an idle frame waits out the timeout,
                // which is what gives the engine wall-clock time to reply.
                std::thread::sleep(timeout);
            }
            Ok(event)
        }
    }

    #[test]
    fn session_evaluates_and_shuts_down_cleanly() {
        let mut frontend = ScriptedFrontend::new(vec![
            Some(FrontendEvent::Submit("1+1".into())),
            // Idle frames so the reply has time to arrive and render.
            None,
            None,
            None,
            None,
            None,
        ]);
        // Sleep-free determinism is not possible across real threads, but
        // several 16ms frames are orders of magnitude beyond what the
        // engine needs for one arithmetic reply.
        run(vec!["abacus".into()], &mut frontend).unwrap();

        assert!(
            frontend
                .console_seen
                .contains(&(ConsoleTag::Echo, "1+1".into())),
            "echo line missing: {:?}",
            frontend.console_seen
        );
        assert!(
            frontend
                .console_seen
                .contains(&(ConsoleTag::Output, "2".into())),
            "result line missing: {:?}",
            frontend.console_seen
        );
    }

    fn command_fixture() -> (SharedContext, WidgetRegistry) {
        let ctx = SharedContext::new(vec![]);
        let mut registry = WidgetRegistry::new();
        install_console(&mut registry);
        (ctx, registry)
    }

    fn console_errors(registry: &mut WidgetRegistry) -> usize {
        console_mut(registry)
            .map(|c| c.lines().filter(|l| l.tag == ConsoleTag::Error).count())
            .unwrap_or(0)
    }

    #[test]
    fn filter_command_targets_the_named_widget() {
        let (ctx, mut registry) = command_fixture();
        let id = WidgetId::new(0, 0);
        registry.add(UiWidget::new(id, WidgetKind::Chart, "C"));

        handle_command(&ctx, &mut registry, "filter C x*2");
        match ctx.ui_to_engine().pop() {
            Some(UiMessage::SetPostFilter { widget, expr }) => {
                assert_eq!(widget, id);
                assert_eq!(expr.as_deref(), Some("x*2"));
            }
            other => panic!("expected SetPostFilter, got {other:?}"),
        }

        // Without an expression the filter is cleared.
        handle_command(&ctx, &mut registry, "filter C");
        match ctx.ui_to_engine().pop() {
            Some(UiMessage::SetPostFilter { widget, expr }) => {
                assert_eq!(widget, id);
                assert!(expr.is_none());
            }
            other => panic!("expected SetPostFilter, got {other:?}"),
        }
    }

    #[test]
    fn close_command_returns_render_data_for_disposal() {
        let (ctx, mut registry) = command_fixture();
        let id = WidgetId::new(0, 0);
        registry.add(UiWidget::new(id, WidgetKind::Table, "T"));
        registry.update_data(id, ValueHandle::from_raw(7));

        handle_command(&ctx, &mut registry, "close T");
        assert!(registry.get(id).is_none());
        match ctx.ui_to_engine().pop() {
            Some(UiMessage::Drop { value }) => assert_eq!(value.raw(), 7),
            other => panic!("expected Drop, got {other:?}"),
        }
        assert!(ctx.ui_to_engine().is_empty());
    }

    #[test]
    fn bad_commands_report_errors_without_reaching_the_engine() {
        let (ctx, mut registry) = command_fixture();
        handle_command(&ctx, &mut registry, "filter nope x*2");
        handle_command(&ctx, &mut registry, "close nope");
        handle_command(&ctx, &mut registry, "close console");
        handle_command(&ctx, &mut registry, "bogus");
        assert!(ctx.ui_to_engine().is_empty());
        assert_eq!(console_errors(&mut registry), 4);
    }

    #[test]
    fn backslash_lines_are_commands_not_expressions() {
        let (ctx, mut registry) = command_fixture();
        submit(&ctx, &mut registry, "\\bogus".into());
        assert!(ctx.ui_to_engine().is_empty());
        assert_eq!(console_errors(&mut registry), 1);
    }

    #[test]
    fn missing_preload_script_fails_the_session() {
        let mut frontend = ScriptedFrontend::new(vec![]);
        let err = run(
            vec!["abacus".into(), "/nonexistent/missing.ab".into()],
            &mut frontend,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::EngineStartup));
    }
}
