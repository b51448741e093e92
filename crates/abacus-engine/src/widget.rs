//! Engine-side widget state and the table that owns it.
//!
//! A widget is split between the threads: this half holds the fields a
//! script can touch (source value, post-filter, selection callback); the
//! presentation half lives in the UI registry. The two halves share a
//! [`WidgetId`], never a reference.

use crate::eval::Expr;
use crate::value::Value;
use abacus_bridge::{WidgetId, WidgetKind};

/// Script-visible half of a widget. Engine thread only.
#[derive(Debug)]
pub struct EngineWidget {
    /// Display kind, fixed at creation.
    pub kind: WidgetKind,
    /// Display name, fixed at creation.
    pub name: String,
    /// The last value drawn onto the widget, before filtering.
    pub source: Option<Value>,
    /// Optional transform applied to each drawn value before display.
    pub post_filter: Option<Expr>,
    /// Optional selection callback, invoked by the renderer seam when the
    /// user picks a row or point. Installed by scripts; unused until a
    /// frontend wires selection events through.
    pub on_select: Option<Expr>,
}

impl EngineWidget {
    /// Create a widget with no data, filter, or callback.
    pub fn new(kind: WidgetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            source: None,
            post_filter: None,
            on_select: None,
        }
    }
}

struct Slot {
    generation: u32,
    widget: Option<EngineWidget>,
}

/// Generation-checked table of live engine widgets.
///
/// Ids remain stable for the life of the session. A slot freed by
/// [`WidgetTable::remove`] bumps its generation, so an id minted for the
/// old occupant no longer resolves: scripts holding a stale handle get an
/// error, not another widget's state.
#[derive(Default)]
pub struct WidgetTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl WidgetTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a widget and mint its id.
    pub fn insert(&mut self, widget: EngineWidget) -> WidgetId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.widget = Some(widget);
            return WidgetId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            widget: Some(widget),
        });
        WidgetId::new(index, 0)
    }

    /// Resolve an id, rejecting stale generations.
    pub fn get(&self, id: WidgetId) -> Option<&EngineWidget> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.widget.as_ref()
    }

    /// Mutable variant of [`WidgetTable::get`].
    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut EngineWidget> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.widget.as_mut()
    }

    /// Remove a widget, invalidating every copy of its id.
    pub fn remove(&mut self, id: WidgetId) -> Option<EngineWidget> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let widget = slot.widget.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(widget)
    }

    /// Number of live widgets.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.widget.is_some()).count()
    }

    /// Whether the table holds no widgets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
