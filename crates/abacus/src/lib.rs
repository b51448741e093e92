#![forbid(unsafe_code)]

//! Abacus: a two-thread array-runtime dashboard.
//!
//! The binary wires three layers together: [`abacus_bridge`] (queues,
//! handles, shared context), [`abacus_engine`] (the script runtime and its
//! thread), and [`abacus_ui`] (registry and frame pump). This crate adds
//! the session loop that owns both ends — spawn, ready handshake, frame
//! loop, drain, join — and a terminal frontend behind the [`Frontend`]
//! seam so tests can drive a whole session without a terminal.

pub mod frontend;
pub mod session;
pub mod term;

pub use frontend::{Frontend, FrontendEvent};
pub use session::{SessionError, run};
pub use term::TermFrontend;
