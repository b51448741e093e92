//! Presentation half of a widget. UI thread only.

use crate::console::Console;
use abacus_bridge::{ValueHandle, WidgetId, WidgetKind};

/// UI state for a table pane.
#[derive(Debug, Default)]
pub struct TableState {
    /// Selected row, if any.
    pub selected: Option<usize>,
    /// First visible row.
    pub scroll: usize,
}

/// UI state for a chart pane.
#[derive(Debug)]
pub struct ChartState {
    /// Draw point markers on top of the line.
    pub show_points: bool,
}

impl Default for ChartState {
    fn default() -> Self {
        Self { show_points: true }
    }
}

/// UI state for a text pane: the body is pre-formatted by the engine.
#[derive(Debug, Default)]
pub struct TextState {
    /// Finished display text.
    pub body: String,
}

/// Kind-specific pane state.
#[derive(Debug)]
pub enum PaneState {
    /// Table selection and scroll position.
    Table(TableState),
    /// Chart display options.
    Chart(ChartState),
    /// Pre-formatted text body.
    Text(TextState),
    /// Console scrollback and input history.
    Console(Console),
}

/// The UI-owned half of a widget.
///
/// Built by the registry when a `WidgetCreated` message arrives; the
/// engine-owned half never appears here. There are no engine fields to
/// protect at teardown: dropping a `UiWidget` drops inert handles only,
/// and values still resident in the engine store are reclaimed when that
/// store goes down with its thread.
#[derive(Debug)]
pub struct UiWidget {
    id: WidgetId,
    kind: WidgetKind,
    name: String,
    /// Whether the pane is shown; closed panes are skipped by render.
    pub open: bool,
    /// Dock placement slot.
    pub dock_id: u32,
    /// Kind-specific UI state.
    pub state: PaneState,
    render_data: Option<ValueHandle>,
}

impl UiWidget {
    /// Build a pane for a newly created widget, open by default.
    pub fn new(id: WidgetId, kind: WidgetKind, name: impl Into<String>) -> Self {
        let state = match kind {
            WidgetKind::Table => PaneState::Table(TableState::default()),
            WidgetKind::Chart => PaneState::Chart(ChartState::default()),
            WidgetKind::Text => PaneState::Text(TextState::default()),
            WidgetKind::Console => PaneState::Console(Console::new()),
        };
        Self {
            id,
            kind,
            name: name.into(),
            open: true,
            dock_id: 0,
            state,
            render_data: None,
        }
    }

    /// Stable id shared with the engine half.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Display kind.
    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handle of the value currently shown, if any. Renderers may
    /// read it; only the registry swaps it.
    pub fn render_data(&self) -> Option<&ValueHandle> {
        self.render_data.as_ref()
    }

    pub(crate) fn swap_render_data(&mut self, new: ValueHandle) -> Option<ValueHandle> {
        self.render_data.replace(new)
    }

    /// Take the render-data handle out, leaving the pane showing nothing.
    /// Used when a pane is closed: the handle must go back to the engine
    /// as a `Drop` command, since dropping it here would leak the value.
    pub fn take_render_data(&mut self) -> Option<ValueHandle> {
        self.render_data.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panes_start_open_with_kind_matched_state() {
        let w = UiWidget::new(WidgetId::new(0, 0), WidgetKind::Table, "T");
        assert!(w.open);
        assert!(w.render_data().is_none());
        assert!(matches!(w.state, PaneState::Table(_)));

        let c = UiWidget::new(WidgetId::detached(), WidgetKind::Console, "console");
        assert!(matches!(c.state, PaneState::Console(_)));
    }
}
