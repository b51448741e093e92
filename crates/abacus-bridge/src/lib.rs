#![forbid(unsafe_code)]

//! Cross-thread bridge between the array runtime and the dashboard UI.
//!
//! Abacus runs exactly two long-lived threads: the engine thread owns the
//! embedded array runtime (and every value it allocates), the UI thread owns
//! the window loop and all presentation state. This crate is the only thing
//! they share: a pair of bounded queues, a small amount of lock-protected
//! session state, and the closed message vocabulary that crosses between
//! them.
//!
//! The load-bearing rule is ownership handoff. Runtime values travel as
//! opaque [`ValueHandle`]s; the UI side may hold a handle, pass it back, or
//! replace it, but it can never free the value behind it. Reclamation always
//! happens on the engine thread, via a [`UiMessage::Drop`] round trip.
//!
//! # Modules
//!
//! - [`queue`]: fixed-capacity, non-blocking MPSC-ish ring (one per
//!   direction).
//! - [`context`]: shared session state — queues, ready handshake, quit flag,
//!   engine waker.
//! - [`message`]: the two tagged message sets (UI→engine, engine→UI).
//! - [`value`]: opaque value and widget handles.
//! - [`waker`]: the one-method seam the UI uses to rouse the engine loop.

pub mod context;
pub mod message;
pub mod queue;
pub mod value;
pub mod waker;

pub use context::SharedContext;
pub use message::{ConsoleLine, ConsoleTag, EngineMessage, UiMessage, UpdatePayload, WidgetKind};
pub use queue::{DEFAULT_QUEUE_CAPACITY, Queue, QueueFull};
pub use value::{ValueHandle, WidgetId};
pub use waker::EngineWaker;
