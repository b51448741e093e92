//! UI-thread widget registry.
//!
//! Single-threaded by design: it lives on the UI thread and is never
//! shared, so the data swap needs no lock — the split-ownership rule is
//! what keeps the two threads off each other's widget state.

use crate::render::PaneRenderer;
use crate::widget::{PaneState, UiWidget};
use abacus_bridge::{ValueHandle, WidgetId, WidgetKind};
use tracing::{debug, warn};

/// Outcome of [`WidgetRegistry::update_data`].
///
/// Every carried [`ValueHandle`] is one the caller MUST forward to the
/// engine as a `Drop` message — this rule is what makes disposal
/// exactly-once: the UI never frees, the engine never misses a
/// superseded value.
#[derive(Debug)]
pub enum DataSwap {
    /// New value installed; the previous one must be forwarded for
    /// disposal.
    Superseded(ValueHandle),
    /// New value installed; there was nothing before.
    Fresh,
    /// The incoming handle names the value already shown; nothing to
    /// dispose (disposing it would free a value still in use).
    Unchanged,
    /// No such widget; the undeliverable value must be forwarded for
    /// disposal.
    NoSuchWidget(ValueHandle),
}

/// The UI thread's collection of panes.
#[derive(Default)]
pub struct WidgetRegistry {
    widgets: Vec<UiWidget>,
}

impl WidgetRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over presentation ownership of a pane; it becomes
    /// render-eligible next frame.
    pub fn add(&mut self, widget: UiWidget) {
        if self.get(widget.id()).is_some() {
            warn!(id = %widget.id(), "duplicate widget registration ignored");
            return;
        }
        debug!(id = %widget.id(), kind = %widget.kind(), name = widget.name(), "widget registered");
        self.widgets.push(widget);
    }

    /// Remove a pane, returning it.
    pub fn remove(&mut self, id: WidgetId) -> Option<UiWidget> {
        let at = self.widgets.iter().position(|w| w.id() == id)?;
        Some(self.widgets.remove(at))
    }

    /// Look up a pane.
    pub fn get(&self, id: WidgetId) -> Option<&UiWidget> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut UiWidget> {
        self.widgets.iter_mut().find(|w| w.id() == id)
    }

    /// First pane of the given kind. Linear scan; used to route console
    /// output to the singleton console pane.
    pub fn find_by_kind(&mut self, kind: WidgetKind) -> Option<&mut UiWidget> {
        self.widgets.iter_mut().find(|w| w.kind() == kind)
    }

    /// First pane with the given display name. Names are script-chosen
    /// and not guaranteed unique; first registration wins.
    pub fn find_by_name(&self, name: &str) -> Option<&UiWidget> {
        self.widgets.iter().find(|w| w.name() == name)
    }

    /// Number of registered panes.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Whether no panes are registered.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Swap a widget's render data for `new`, reporting what must be
    /// forwarded for disposal. See [`DataSwap`].
    pub fn update_data(&mut self, id: WidgetId, new: ValueHandle) -> DataSwap {
        let Some(widget) = self.get_mut(id) else {
            warn!(%id, "data update for unknown widget");
            return DataSwap::NoSuchWidget(new);
        };
        if let Some(current) = widget.render_data()
            && current.same_value(&new)
        {
            // Same value redelivered: dropping either handle's value would
            // pull the data out from under the pane.
            return DataSwap::Unchanged;
        }
        match widget.swap_render_data(new) {
            Some(old) => DataSwap::Superseded(old),
            None => DataSwap::Fresh,
        }
    }

    /// Render every open pane, dispatching by kind.
    ///
    /// The only place UI-owned widget state is read for display.
    pub fn render(&mut self, renderer: &mut dyn PaneRenderer) {
        for widget in &mut self.widgets {
            if !widget.open {
                continue;
            }
            match widget.kind() {
                WidgetKind::Table => renderer.table(widget),
                WidgetKind::Chart => renderer.chart(widget),
                WidgetKind::Text => renderer.text(widget),
                WidgetKind::Console => renderer.console(widget),
            }
        }
    }

    /// Tear the registry down at session end, discarding all panes.
    ///
    /// Render-data handles still held are dropped as inert ids — the
    /// engine thread is gone by now, so their values are reclaimed with
    /// the engine store, never freed from here.
    pub fn destroy_all(&mut self) {
        let mut orphaned = 0usize;
        for widget in self.widgets.drain(..) {
            if widget.render_data().is_some() {
                orphaned += 1;
            }
        }
        if orphaned > 0 {
            debug!(orphaned, "render data handles discarded at teardown");
        }
    }

    /// Route a line to the console pane, if one exists.
    pub fn console_push(&mut self, line: abacus_bridge::ConsoleLine) {
        match self.find_by_kind(WidgetKind::Console) {
            Some(pane) => {
                if let PaneState::Console(console) = &mut pane.state {
                    console.push(line);
                }
            }
            None => debug!("console line dropped, no console pane"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::NullRenderer;

    fn handle(raw: u64) -> ValueHandle {
        ValueHandle::from_raw(raw)
    }

    fn pane(index: u32, kind: WidgetKind) -> UiWidget {
        UiWidget::new(WidgetId::new(index, 0), kind, format!("w{index}"))
    }

    #[test]
    fn update_data_reports_the_superseded_value() {
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        reg.add(UiWidget::new(id, WidgetKind::Table, "T"));

        assert!(matches!(reg.update_data(id, handle(1)), DataSwap::Fresh));
        match reg.update_data(id, handle(2)) {
            DataSwap::Superseded(old) => assert_eq!(old.raw(), 1),
            other => panic!("expected Superseded, got {other:?}"),
        }
        assert_eq!(reg.get(id).unwrap().render_data().unwrap().raw(), 2);
    }

    #[test]
    fn redelivered_value_is_not_offered_for_disposal() {
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        reg.add(UiWidget::new(id, WidgetKind::Chart, "C"));
        reg.update_data(id, handle(7));
        assert!(matches!(reg.update_data(id, handle(7)), DataSwap::Unchanged));
        assert_eq!(reg.get(id).unwrap().render_data().unwrap().raw(), 7);
    }

    #[test]
    fn unknown_widget_returns_the_undeliverable_value() {
        let mut reg = WidgetRegistry::new();
        match reg.update_data(WidgetId::new(5, 0), handle(9)) {
            DataSwap::NoSuchWidget(h) => assert_eq!(h.raw(), 9),
            other => panic!("expected NoSuchWidget, got {other:?}"),
        }
    }

    #[test]
    fn render_skips_closed_panes() {
        let mut reg = WidgetRegistry::new();
        reg.add(pane(0, WidgetKind::Table));
        reg.add(pane(1, WidgetKind::Chart));
        reg.get_mut(WidgetId::new(1, 0)).unwrap().open = false;

        let mut renderer = NullRenderer::default();
        reg.render(&mut renderer);
        assert_eq!(renderer.rendered, 1);
    }

    #[test]
    fn find_by_kind_locates_the_console() {
        let mut reg = WidgetRegistry::new();
        reg.add(pane(0, WidgetKind::Table));
        reg.add(UiWidget::new(
            WidgetId::detached(),
            WidgetKind::Console,
            "console",
        ));
        assert_eq!(
            reg.find_by_kind(WidgetKind::Console).unwrap().kind(),
            WidgetKind::Console
        );
        assert!(reg.find_by_kind(WidgetKind::Text).is_none());
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut reg = WidgetRegistry::new();
        reg.add(pane(0, WidgetKind::Table));
        reg.add(pane(0, WidgetKind::Table));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn destroy_all_empties_the_registry() {
        let mut reg = WidgetRegistry::new();
        let id = WidgetId::new(0, 0);
        reg.add(UiWidget::new(id, WidgetKind::Table, "T"));
        reg.update_data(id, handle(1));
        reg.destroy_all();
        assert!(reg.is_empty());
    }
}
