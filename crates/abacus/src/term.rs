//! Line-oriented terminal frontend built on crossterm.
//!
//! This is deliberately a REPL, not a full-screen TUI: console lines are
//! appended as they arrive, non-console panes print a short notice when
//! their data changes, and the prompt is redrawn in place. Raw mode is
//! scoped to a guard so a panic or early return still restores the
//! terminal.

use crate::frontend::{Frontend, FrontendEvent};
use abacus_bridge::WidgetId;
use abacus_ui::{Console, PaneRenderer, PaneState, UiWidget};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;
use tracing::warn;

const PROMPT: &str = "> ";

/// Enables raw mode for its lifetime.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!("failed to restore terminal mode: {err}");
        }
    }
}

/// Terminal REPL frontend.
pub struct TermFrontend {
    _raw: RawModeGuard,
    input: String,
    /// Count of console lines ever printed, compared against the
    /// console's monotonic push count so each line renders exactly once.
    printed: u64,
    /// Last body printed per text pane.
    text_seen: HashMap<WidgetId, String>,
    /// Raw id of the handle last announced per table/chart pane.
    data_seen: HashMap<WidgetId, u64>,
    prompt_dirty: bool,
}

impl TermFrontend {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            _raw: RawModeGuard::new()?,
            input: String::new(),
            printed: 0,
            text_seen: HashMap::new(),
            data_seen: HashMap::new(),
            prompt_dirty: true,
        })
    }

    fn set_input(&mut self, text: String) {
        self.input = text;
        self.prompt_dirty = true;
    }

    /// Erase the current prompt line, print `lines`, redraw the prompt.
    fn print_lines(&mut self, lines: &[String]) {
        if lines.is_empty() && !self.prompt_dirty {
            return;
        }
        let mut out = io::stdout();
        let mut write = || -> io::Result<()> {
            // Raw mode: carriage return + explicit clear, newlines by hand.
            write!(out, "\r\x1b[2K")?;
            for line in lines {
                write!(out, "{line}\r\n")?;
            }
            write!(out, "{PROMPT}{}", self.input)?;
            out.flush()
        };
        if let Err(err) = write() {
            warn!("terminal write failed: {err}");
        }
        self.prompt_dirty = false;
    }

    fn announce(&mut self, pane: &UiWidget) {
        let line = format!("[{}] {} updated", pane.name(), pane.kind());
        self.print_lines(&[line]);
    }
}

impl PaneRenderer for TermFrontend {
    fn table(&mut self, pane: &mut UiWidget) {
        data_pane(self, pane);
    }

    fn chart(&mut self, pane: &mut UiWidget) {
        data_pane(self, pane);
    }

    fn text(&mut self, pane: &mut UiWidget) {
        let body = match &pane.state {
            PaneState::Text(state) => state.body.clone(),
            _ => return,
        };
        if self.text_seen.get(&pane.id()).is_some_and(|b| *b == body) {
            return;
        }
        let line = format!("[{}] {body}", pane.name());
        self.text_seen.insert(pane.id(), body);
        self.print_lines(&[line]);
    }

    fn console(&mut self, pane: &mut UiWidget) {
        let PaneState::Console(console) = &pane.state else {
            return;
        };
        let fresh = fresh_console_lines(console, self.printed);
        self.printed = console.total_pushed();
        self.print_lines(&fresh);
    }
}

/// Lines pushed since `printed` lines were printed, clamped to what the
/// scrollback still holds. Works off the console's monotonic push count:
/// `len()` saturates at the scrollback bound, so indexing the deque by a
/// printed-line count would go silent once the console fills.
fn fresh_console_lines(console: &Console, printed: u64) -> Vec<String> {
    let held = console.len();
    let new = console
        .total_pushed()
        .saturating_sub(printed)
        .min(held as u64) as usize;
    console
        .lines()
        .skip(held - new)
        .map(|line| line.text.clone())
        .collect()
}

fn data_pane(term: &mut TermFrontend, pane: &mut UiWidget) {
    let Some(handle) = pane.render_data() else {
        return;
    };
    let raw = handle.raw();
    if term.data_seen.get(&pane.id()).is_some_and(|r| *r == raw) {
        return;
    }
    term.data_seen.insert(pane.id(), raw);
    term.announce(pane);
}

impl Frontend for TermFrontend {
    fn poll(
        &mut self,
        console: &mut Console,
        timeout: Duration,
    ) -> io::Result<Option<FrontendEvent>> {
        if self.prompt_dirty {
            self.print_lines(&[]);
        }
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(Some(FrontendEvent::CloseRequested))
            }
            KeyCode::Esc => Ok(Some(FrontendEvent::CloseRequested)),
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                self.prompt_dirty = true;
                Ok(Some(FrontendEvent::Submit(line)))
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.prompt_dirty = true;
                Ok(None)
            }
            KeyCode::Up => {
                if let Some(prev) = console.history_prev(&self.input) {
                    self.set_input(prev);
                }
                Ok(None)
            }
            KeyCode::Down => {
                if let Some(next) = console.history_next() {
                    self.set_input(next);
                }
                Ok(None)
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.prompt_dirty = true;
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}
