//! Bounded polling: retry a predicate until it succeeds, errors, or the
//! iteration budget runs out.

use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use crate::types::PollConfig;

/// How a bounded poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The predicate reported done.
    Succeeded { attempts: u64 },
    /// The iteration budget was used up without success.
    TimedOut { attempts: u64 },
    /// The predicate returned an error; polling stopped immediately.
    Aborted { attempts: u64, error: String },
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Number of predicate invocations made.
    pub fn attempts(&self) -> u64 {
        match self {
            Self::Succeeded { attempts }
            | Self::TimedOut { attempts }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }
}

/// Invokes a predicate at `interval` spacing, at most
/// `floor(timeout / interval)` times.
///
/// A budget of zero means the predicate is never called and the poll
/// times out immediately. Errors are not retried here; the caller owns
/// any retry of the surrounding operation.
#[derive(Debug, Clone, Copy)]
pub struct BoundedPoller {
    config: PollConfig,
}

impl BoundedPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Run the poll. The predicate resolves to `Ok(true)` when done.
    pub async fn run<F, Fut, E>(&self, mut predicate: F) -> PollOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: fmt::Display,
    {
        let budget = self.config.iteration_budget();
        let mut iteration: u64 = 0;

        while iteration < budget {
            iteration += 1;
            match predicate().await {
                Ok(true) => return PollOutcome::Succeeded { attempts: iteration },
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, poll = iteration, "poll predicate failed, aborting");
                    return PollOutcome::Aborted {
                        attempts: iteration,
                        error: e.to_string(),
                    };
                }
            }

            tokio::time::sleep(self.config.interval()).await;
            debug!(poll = iteration, budget, "polling");
        }

        PollOutcome::TimedOut { attempts: iteration }
    }
}
