//! Opaque handles for engine-owned state.

use std::fmt;

/// Handle to a value owned by the engine thread's runtime store.
///
/// A `ValueHandle` is an id, not the value: it is deliberately neither
/// `Clone` nor `Copy`, so each live handle names its value exactly once and
/// moving it through a message is a real ownership transfer. Dropping a
/// handle does not free the value — off the engine thread that would be an
/// ordering violation — it merely forgets the id, leaking the value until
/// the runtime store itself is torn down. The one correct way to reclaim a
/// value is to send the handle back in a
/// [`UiMessage::Drop`](crate::message::UiMessage::Drop).
#[derive(PartialEq, Eq, Hash)]
pub struct ValueHandle(u64);

impl ValueHandle {
    /// Wrap a raw store id. Called by the runtime store when it exports a
    /// value across the bridge.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw store id.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether two handles name the same stored value.
    ///
    /// Used by the registry's data swap to avoid queueing a disposal for a
    /// value that is still the one being shown.
    pub fn same_value(&self, other: &ValueHandle) -> bool {
        self.0 == other.0
    }
}

impl fmt::Debug for ValueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueHandle({})", self.0)
    }
}

/// Generation-checked handle to a widget.
///
/// The id is stable for the life of the session and shared by both halves
/// of a widget: the engine-side entry in the widget table and the UI-side
/// presentation struct. The generation lets the engine reject a stale
/// handle (a script holding on to a widget that was since destroyed) with
/// an error instead of touching reused storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

impl WidgetId {
    /// Build an id from a table slot and its generation.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Id for a UI-created pane that has no engine-side half (the built-in
    /// console). Never handed to the engine.
    pub fn detached() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Table slot index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at the time the id was minted.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_by_raw_id() {
        let a = ValueHandle::from_raw(7);
        let b = ValueHandle::from_raw(7);
        let c = ValueHandle::from_raw(8);
        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));
    }

    #[test]
    fn widget_ids_distinguish_generations() {
        let first = WidgetId::new(3, 0);
        let reused = WidgetId::new(3, 1);
        assert_ne!(first, reused);
        assert_eq!(first.index(), reused.index());
    }
}
