//! The exported-value store.
//!
//! Every runtime value that crosses the bridge is first moved in here and
//! travels as the [`ValueHandle`] this store mints. The store lives and
//! dies with the engine thread: `dispose` is the only reclamation path
//! while the session runs, and whatever is still resident at shutdown is
//! reclaimed when the store is dropped with the thread.

use crate::value::Value;
use abacus_bridge::ValueHandle;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Engine-thread-owned table of values currently on loan to the UI.
#[derive(Default)]
pub struct ValueStore {
    values: HashMap<u64, Value>,
    next_id: u64,
}

impl ValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a value in and mint the handle that names it.
    pub fn export(&mut self, value: Value) -> ValueHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.values.insert(id, value);
        ValueHandle::from_raw(id)
    }

    /// Reclaim the value behind `handle`, consuming the handle.
    ///
    /// Returns the value so callers can drop or reuse it. A handle that
    /// names nothing (already disposed, or never minted here) is a protocol
    /// violation upstream; it is logged and ignored rather than faulted on.
    pub fn dispose(&mut self, handle: ValueHandle) -> Option<Value> {
        let removed = self.values.remove(&handle.raw());
        if removed.is_none() {
            warn!(id = handle.raw(), "disposal for unknown value id");
        } else {
            debug!(id = handle.raw(), live = self.values.len(), "value disposed");
        }
        removed
    }

    /// Borrow a stored value. Engine-side use only (filters, tests).
    pub fn get(&self, handle: &ValueHandle) -> Option<&Value> {
        self.values.get(&handle.raw())
    }

    /// Number of values currently on loan.
    pub fn live_values(&self) -> usize {
        self.values.len()
    }
}
