//! Deadline-bounded content polling.
//!
//! A background ticker probes the URL every interval while the caller
//! waits on whichever comes first: a matching probe or the deadline.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use failcheck_core::{ContentCheck, PollConfig};

use crate::probe::Probe;

/// How a content poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPollOutcome {
    /// A probe found the expected content.
    Matched { probes: u64 },
    /// The deadline passed first.
    TimedOut { probes: u64 },
}

impl ContentPollOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Failure units for the cumulative exit code: 0 or 1.
    pub fn failure_count(&self) -> u32 {
        if self.is_match() { 0 } else { 1 }
    }

    /// Probes started before the poll ended.
    pub fn probes(&self) -> u64 {
        match self {
            Self::Matched { probes } | Self::TimedOut { probes } => *probes,
        }
    }
}

/// Probe `check` every `config.interval()` until it matches or
/// `config.timeout()` elapses.
///
/// The first probe fires one interval after the call. The ticker task is
/// aborted on both outcomes, so no probe starts after this returns. A
/// match that lands together with the deadline counts as a match.
pub async fn poll_for_content<P>(
    probe: Arc<P>,
    check: ContentCheck,
    config: PollConfig,
) -> ContentPollOutcome
where
    P: Probe + ?Sized + 'static,
{
    let (found_tx, found_rx) = oneshot::channel();
    let probes = Arc::new(AtomicU64::new(0));

    let ticker = tokio::spawn(run_ticker(
        probe,
        check.clone(),
        config.interval(),
        probes.clone(),
        found_tx,
    ));

    let outcome = tokio::select! {
        biased;
        Ok(n) = found_rx => ContentPollOutcome::Matched { probes: n },
        _ = tokio::time::sleep(config.timeout()) => ContentPollOutcome::TimedOut {
            probes: probes.load(Ordering::Relaxed),
        },
    };
    ticker.abort();

    match outcome {
        ContentPollOutcome::Matched { probes } => {
            info!(url = check.url(), probes, "content check polling finished");
        }
        ContentPollOutcome::TimedOut { probes } => {
            warn!(
                url = check.url(),
                probes,
                timeout_secs = config.timeout().as_secs(),
                "content check polling timed out"
            );
        }
    }
    outcome
}

async fn run_ticker<P>(
    probe: Arc<P>,
    check: ContentCheck,
    interval: Duration,
    probes: Arc<AtomicU64>,
    found: oneshot::Sender<u64>,
) where
    P: Probe + ?Sized,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let n = probes.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(probe = n, url = check.url(), "poll for content check");

        match probe.probe(&check).await {
            Ok(true) => {
                // Sending consumes the sender: at most one signal.
                let _ = found.send(n);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, url = check.url(), probe = n, "content probe failed");
            }
        }
    }
}
