//! Bounded retry for idempotent reads.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::domain::GatewayError;
use crate::domain::ports::RetrySleeper;

/// Retry budget for idempotent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; at least 1.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Run `attempt` until it succeeds, fails permanently, or the budget is
    /// spent. Only errors for which [`GatewayError::is_retryable`] holds are
    /// retried.
    pub(super) async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn RetrySleeper,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt_number = 1;
        loop {
            match attempt().await {
                Err(error) if error.is_retryable() && attempt_number < max_attempts => {
                    warn!(
                        attempt = attempt_number,
                        max_attempts,
                        error = %error,
                        "retrying upstream read"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(GatewayError::cancelled()),
                        () = sleeper.sleep(self.delay) => {}
                    }
                    attempt_number += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::domain::ErrorKind;
    use crate::test_support::RecordingSleeper;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(250),
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);
        let outcome = policy(3)
            .run(&sleeper, &CancellationToken::new(), move || async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(GatewayError::upstream_unavailable("reset")),
                    _ => Ok("ok"),
                }
            })
            .await;

        assert_eq!(outcome, Ok("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(250)]);
    }

    #[tokio::test]
    async fn stops_after_budget() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);
        let outcome: Result<(), _> = policy(3)
            .run(&sleeper, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::upstream("busy").with_status(503))
            })
            .await;

        assert_eq!(outcome.map_err(|err| err.kind()), Err(ErrorKind::Upstream));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.recorded().len(), 2);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let sleeper = RecordingSleeper::default();
        let calls = &AtomicU32::new(0);
        let outcome: Result<(), _> = policy(5)
            .run(&sleeper, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::not_found("gone").with_status(404))
            })
            .await;

        assert!(outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let sleeper = RecordingSleeper::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome: Result<(), _> = policy(3)
            .run(&sleeper, &cancel, || async {
                Err(GatewayError::upstream_unavailable("reset"))
            })
            .await;

        assert_eq!(outcome, Err(GatewayError::cancelled()));
    }
}
