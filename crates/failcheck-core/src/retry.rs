//! Fixed-attempt retry.

use std::future::Future;

use tracing::debug;

/// Result of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The operation succeeded; stop.
    Succeeded,
    /// The operation failed and may be tried again.
    Failed,
    /// The operation failed in a way that must not be retried.
    Abort,
}

/// Tally of a bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOutcome {
    pub attempts: u32,
    pub failures: u32,
    pub succeeded: bool,
}

impl RetryOutcome {
    /// Failure units to report: zero once any attempt succeeded,
    /// otherwise one per failed attempt.
    pub fn failure_count(&self) -> u32 {
        if self.succeeded { 0 } else { self.failures }
    }
}

/// Run `attempt` up to `max_attempts` times.
///
/// The closure receives the 1-based attempt number. `Failed` moves on to
/// the next attempt, `Abort` stops immediately; both count one failure.
pub async fn retry_bounded<F, Fut>(max_attempts: u32, mut attempt: F) -> RetryOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt>,
{
    let mut outcome = RetryOutcome {
        attempts: 0,
        failures: 0,
        succeeded: false,
    };

    while outcome.attempts < max_attempts {
        outcome.attempts += 1;
        match attempt(outcome.attempts).await {
            Attempt::Succeeded => {
                outcome.succeeded = true;
                break;
            }
            Attempt::Failed => {
                outcome.failures += 1;
                debug!(attempt = outcome.attempts, max_attempts, "attempt failed");
            }
            Attempt::Abort => {
                outcome.failures += 1;
                debug!(attempt = outcome.attempts, "attempt aborted, not retrying");
                break;
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stops_on_first_success() {
        let outcome = retry_bounded(3, |n| async move {
            if n == 2 { Attempt::Succeeded } else { Attempt::Failed }
        })
        .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.failures, 1);
        assert!(outcome.succeeded);
        assert_eq!(outcome.failure_count(), 0);
    }

    #[tokio::test]
    async fn exhausts_attempts() {
        let outcome = retry_bounded(3, |_| async { Attempt::Failed }).await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.failure_count(), 3);
    }

    #[tokio::test]
    async fn abort_short_circuits() {
        let outcome = retry_bounded(3, |_| async { Attempt::Abort }).await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.failure_count(), 1);
    }

    #[tokio::test]
    async fn abort_after_failures_keeps_count() {
        let outcome = retry_bounded(3, |n| async move {
            if n == 1 { Attempt::Failed } else { Attempt::Abort }
        })
        .await;
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.failure_count(), 2);
    }

    #[tokio::test]
    async fn zero_attempts_is_a_noop() {
        let outcome = retry_bounded(0, |_| async { Attempt::Succeeded }).await;
        assert_eq!(outcome.attempts, 0);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure_count(), 0);
    }
}
