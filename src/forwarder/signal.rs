use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Shared, monotonic stop flag
///
/// Starts unset, is set at most once, and never resets. Copy tasks check it
/// without blocking between polls and await it while idle.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
    triggered: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal. Returns `true` only for the call that set it.
    pub fn trigger(&self) -> bool {
        let first = !self.triggered.swap(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the signal is set
    pub async fn wait(&self) {
        self.token.cancelled().await
    }
}
