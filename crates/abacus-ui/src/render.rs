//! The renderer seam.
//!
//! Actual drawing — cells, plots, styling — is a collaborator concern; the
//! registry only dispatches. A renderer receives the pane, may mutate its
//! UI state (selection, scroll), and can read the `render_data` handle; by
//! construction it has no path to engine-owned state.

use crate::widget::UiWidget;

/// Per-kind pane drawing, implemented by the frontend.
pub trait PaneRenderer {
    /// Draw a table pane.
    fn table(&mut self, pane: &mut UiWidget);

    /// Draw a chart pane.
    fn chart(&mut self, pane: &mut UiWidget);

    /// Draw a text pane.
    fn text(&mut self, pane: &mut UiWidget);

    /// Draw the console pane.
    fn console(&mut self, pane: &mut UiWidget);
}

/// Renderer that draws nothing and counts dispatches. For tests and
/// headless runs.
#[derive(Debug, Default)]
pub struct NullRenderer {
    /// Panes dispatched since construction.
    pub rendered: usize,
}

impl PaneRenderer for NullRenderer {
    fn table(&mut self, _pane: &mut UiWidget) {
        self.rendered += 1;
    }

    fn chart(&mut self, _pane: &mut UiWidget) {
        self.rendered += 1;
    }

    fn text(&mut self, _pane: &mut UiWidget) {
        self.rendered += 1;
    }

    fn console(&mut self, _pane: &mut UiWidget) {
        self.rendered += 1;
    }
}
