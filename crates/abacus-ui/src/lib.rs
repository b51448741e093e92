#![forbid(unsafe_code)]

//! The UI half of Abacus.
//!
//! Everything here runs on the UI thread. It owns the presentation side of
//! every widget — open flag, dock placement, per-kind pane state, and the
//! handle of the value currently rendered — and the per-frame pump that
//! applies engine messages to the registry.
//!
//! The UI never looks inside an engine value. It holds
//! [`ValueHandle`](abacus_bridge::ValueHandle)s, swaps them, and returns
//! superseded ones to the engine as
//! [`UiMessage::Drop`](abacus_bridge::UiMessage::Drop) commands; actual
//! pixel/cell rendering is behind the [`render::PaneRenderer`] seam.

pub mod console;
pub mod pump;
pub mod registry;
pub mod render;
pub mod widget;

pub use console::Console;
pub use pump::{MAX_MESSAGES_PER_FRAME, install_console, pump_frame, pump_frame_with_budget};
pub use registry::{DataSwap, WidgetRegistry};
pub use render::{NullRenderer, PaneRenderer};
pub use widget::{ChartState, PaneState, TableState, TextState, UiWidget};
