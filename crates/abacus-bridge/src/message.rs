//! The closed message vocabulary of the bridge.
//!
//! Two tagged sets, one per direction. Commands flow UI→engine; created
//! widgets, data updates, and evaluation results flow engine→UI; disposal
//! requests flow back UI→engine. No other channel exists between the
//! threads, and within each direction FIFO order is guaranteed by the
//! queue. Across directions there is no ordering guarantee, and no message
//! depends on one.

use crate::value::{ValueHandle, WidgetId};
use std::fmt;

/// Display kind of a widget pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetKind {
    /// Tabular data.
    Table,
    /// Numeric series plot.
    Chart,
    /// A single pre-formatted text label.
    Text,
    /// The interactive console pane.
    Console,
}

impl WidgetKind {
    /// Kind name as it appears in scripts and in widget formatting.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Table => "table",
            WidgetKind::Chart => "chart",
            WidgetKind::Text => "text",
            WidgetKind::Console => "console",
        }
    }

    /// Parse a kind name from a script argument.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "table" => Some(WidgetKind::Table),
            "chart" => Some(WidgetKind::Chart),
            "text" => Some(WidgetKind::Text),
            "console" => Some(WidgetKind::Console),
            _ => None,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands sent from the UI thread to the engine thread.
#[derive(Debug)]
pub enum UiMessage {
    /// Evaluate an expression typed into the console. The engine replies
    /// with [`EngineMessage::Result`].
    Evaluate {
        /// Source text, owned by the message.
        expr: String,
    },

    /// Install (or clear, with `None`) a widget's post-filter expression.
    /// Parsed on the engine thread; on parse failure the previous filter is
    /// retained and an error result is reported.
    SetPostFilter {
        /// Target widget.
        widget: WidgetId,
        /// Filter source, or `None` to clear.
        expr: Option<String>,
    },

    /// Dispose of an engine value the UI no longer shows. This is the
    /// return half of the ownership handoff: the value is freed on the
    /// engine thread, exactly once.
    Drop {
        /// The superseded value.
        value: ValueHandle,
    },

    /// Cooperative shutdown request. The engine sets the shared quit flag
    /// and exits its event loop.
    Quit,
}

/// Payload of a [`EngineMessage::DataUpdate`].
#[derive(Debug)]
pub enum UpdatePayload {
    /// A runtime value to swap into the widget's render data.
    Value(ValueHandle),
    /// Pre-formatted text for the text display kind. Formatting needs
    /// runtime context, so it happens engine-side.
    Text(String),
}

/// Replies and pushes sent from the engine thread to the UI thread.
#[derive(Debug)]
pub enum EngineMessage {
    /// A script created a widget; the UI takes over presentation ownership
    /// and builds the pane.
    WidgetCreated {
        /// The new widget's id.
        widget: WidgetId,
        /// Display kind.
        kind: WidgetKind,
        /// Display name.
        name: String,
    },

    /// New display data for a widget.
    DataUpdate {
        /// Target widget.
        widget: WidgetId,
        /// New render data.
        payload: UpdatePayload,
    },

    /// Outcome of an [`UiMessage::Evaluate`], for the console.
    Result {
        /// Formatted line to display.
        line: ConsoleLine,
        /// The result value, if one was exported. The UI forwards it back
        /// as a [`UiMessage::Drop`] once the line is displayed.
        value: Option<ValueHandle>,
    },
}

/// Classification of a console line, for styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleTag {
    /// Echo of user input.
    Echo,
    /// Normal evaluation output.
    Output,
    /// Evaluation or protocol error.
    Error,
}

/// One formatted line destined for the console pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// Line classification.
    pub tag: ConsoleTag,
    /// Display text, already formatted.
    pub text: String,
}

impl ConsoleLine {
    /// An input-echo line.
    pub fn echo(text: impl Into<String>) -> Self {
        Self {
            tag: ConsoleTag::Echo,
            text: text.into(),
        }
    }

    /// A normal output line.
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            tag: ConsoleTag::Output,
            text: text.into(),
        }
    }

    /// An error line.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tag: ConsoleTag::Error,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            WidgetKind::Table,
            WidgetKind::Chart,
            WidgetKind::Text,
            WidgetKind::Console,
        ] {
            assert_eq!(WidgetKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(WidgetKind::parse("grid"), None);
    }

    #[test]
    fn console_line_constructors_tag() {
        assert_eq!(ConsoleLine::echo("x").tag, ConsoleTag::Echo);
        assert_eq!(ConsoleLine::output("x").tag, ConsoleTag::Output);
        assert_eq!(ConsoleLine::error("x").tag, ConsoleTag::Error);
    }
}
