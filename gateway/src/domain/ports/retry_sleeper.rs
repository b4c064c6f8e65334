//! Sleeping abstraction used between read retries.

use std::time::Duration;

use async_trait::async_trait;

/// Async clock-independent sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
