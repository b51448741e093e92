#![forbid(unsafe_code)]

//! The engine half of Abacus.
//!
//! Everything in this crate runs on the engine thread. It owns the embedded
//! array runtime — a small K-flavored expression language standing in for
//! the production runtime — along with the store of values that have been
//! exported across the bridge, the engine-side widget table, and the pump
//! that executes UI commands and queues replies.
//!
//! The one rule the rest of the crate is built around: runtime values are
//! created, inspected, and destroyed on this thread only. Values cross to
//! the UI as opaque [`ValueHandle`](abacus_bridge::ValueHandle)s minted by
//! the [`store`], and come back for disposal as
//! [`UiMessage::Drop`](abacus_bridge::UiMessage::Drop) commands.

pub mod eval;
pub mod pump;
pub mod service;
pub mod store;
pub mod value;
pub mod widget;

pub use eval::{EvalError, Expr, HostCaps, Interpreter};
pub use service::{EngineService, LoopWaker, spawn};
pub use store::ValueStore;
pub use value::{Value, format_value};
pub use widget::{EngineWidget, WidgetTable};
