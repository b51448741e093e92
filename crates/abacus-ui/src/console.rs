//! Console scrollback and input history.

use abacus_bridge::ConsoleLine;
use std::collections::VecDeque;

const DEFAULT_SCROLLBACK: usize = 1000;

/// Scrollback and input history for the console pane.
///
/// Lines arrive already formatted and tagged (echo, output, error); the
/// console only stores and bounds them. History navigation follows the
/// usual shell shape: walking up saves the in-progress input, walking past
/// the newest entry restores it.
#[derive(Debug)]
pub struct Console {
    lines: VecDeque<ConsoleLine>,
    max_lines: usize,
    total_pushed: u64,
    history: Vec<String>,
    cursor: Option<usize>,
    saved_input: String,
}

impl Console {
    /// Console with the default scrollback bound.
    pub fn new() -> Self {
        Self::with_scrollback(DEFAULT_SCROLLBACK)
    }

    /// Console bounded to `max_lines` of scrollback.
    pub fn with_scrollback(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
            total_pushed: 0,
            history: Vec::new(),
            cursor: None,
            saved_input: String::new(),
        }
    }

    /// Append a display line, evicting the oldest past the bound.
    pub fn push(&mut self, line: ConsoleLine) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.total_pushed += 1;
    }

    /// Display lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.lines.iter()
    }

    /// Number of lines currently held.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the scrollback is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total lines ever pushed, counting ones already evicted.
    ///
    /// Monotonic, unlike [`len`](Self::len), which saturates at the
    /// scrollback bound. Incremental consumers track this instead of
    /// indexing into the shifting deque.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Record a submitted input line and reset history navigation.
    pub fn record_input(&mut self, entry: &str) {
        if !entry.trim().is_empty() {
            self.history.push(entry.to_string());
        }
        self.cursor = None;
        self.saved_input.clear();
    }

    /// Step back through history. `current` is saved on the first step so
    /// it can be restored by walking forward past the end.
    pub fn history_prev(&mut self, current: &str) -> Option<String> {
        if self.history.is_empty() {
            return None;
        }
        let next = match self.cursor {
            None => {
                self.saved_input = current.to_string();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(next);
        Some(self.history[next].clone())
    }

    /// Step forward through history; past the newest entry the saved
    /// input comes back and navigation ends.
    pub fn history_next(&mut self) -> Option<String> {
        let i = self.cursor?;
        if i + 1 >= self.history.len() {
            self.cursor = None;
            Some(std::mem::take(&mut self.saved_input))
        } else {
            self.cursor = Some(i + 1);
            Some(self.history[i + 1].clone())
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
