//! Dispatcher configuration.

use std::time::Duration;

/// Tunables for a [`Dispatcher`](crate::dispatcher::Dispatcher).
///
/// The defaults keep pending calls alive until their owner stops, with no timeout.
#[derive(Clone, Debug, Default)]
pub struct RpcConfig {
    /// Fail calls with `AnswerError::Timeout` once they have waited this long.
    /// Applied on `Dispatcher::tick`.
    pub answer_timeout: Option<Duration>,
    /// Log a warning whenever the number of pending calls grows past this.
    pub pending_warn_threshold: Option<usize>,
}

impl RpcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.answer_timeout = Some(timeout);
        self
    }

    pub fn with_pending_warn_threshold(mut self, threshold: usize) -> Self {
        self.pending_warn_threshold = Some(threshold);
        self
    }
}
