use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Raised by long running loops once cancellation has been requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("layout computation was cancelled")]
pub struct Cancelled;

/// Cooperative cancellation flag shared between a caller and a running layout
///
/// Clones share the same flag. The engine only checks it at loop boundaries,
/// so cancelling never interrupts a step halfway, and a cancelled run never
/// returns a partial layout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every computation holding this token
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation was requested
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
