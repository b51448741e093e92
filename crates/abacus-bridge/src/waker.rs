//! The seam the UI thread uses to rouse the engine's event loop.

/// Cross-thread wake-up for the engine event loop.
///
/// The engine thread blocks in its own loop when it has no work; the UI
/// thread calls [`EngineWaker::wake`] after pushing to the UI→engine queue
/// so pending commands get drained promptly. Implementations must be cheap,
/// non-blocking, and safe to call from any thread at any point in the
/// session; a wake that arrives after the loop has stopped is a no-op.
pub trait EngineWaker: Send + Sync {
    /// Interrupt the engine loop's idle wait.
    fn wake(&self);
}
