//! Cooperative cancellation for engine runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token polled by the engine.
///
/// The engine checks the token at every branch boundary and before each
/// commit classification; once cancelled, the run terminates with
/// `EngineError::Cancelled` and no tag is written for the decision in
/// flight. Clones share the same flag, so a signal handler can hold one
/// clone while the engine polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
