//! Standby workflow — moves a group's instances in and out of standby.
//!
//! ```text
//! enter:  Idle → Entering → Entered | TimedOut
//! exit:   Idle → Exiting(attempt 1..=max) → Exited | Failed
//! ```
//!
//! Fleet polling here is sequential on purpose: an enter must never
//! overlap an exit against the same group.

use tracing::{debug, error, info, warn};

use failcheck_core::{
    ACTIVITY_SUCCESSFUL, Attempt, BoundedPoller, InstanceSet, PollConfig, PollOutcome,
    RetryOutcome, ScalingActivity, retry_bounded,
};
use failcheck_fleet::{FleetController, FleetError, all_activities_reached};

/// Exit-standby attempts before giving up on one restore round.
pub const DEFAULT_EXIT_ATTEMPTS: u32 = 3;

/// Result of an enter-standby phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterOutcome {
    /// The tracked activity; degraded if the call failed.
    pub activity: ScalingActivity,
    pub call_error: Option<String>,
    pub poll: PollOutcome,
}

impl EnterOutcome {
    /// One unit for a failed call plus one for a failed poll.
    ///
    /// The two are independent signals, so the worst case is 2.
    pub fn failure_count(&self) -> u32 {
        u32::from(self.call_error.is_some()) + u32::from(!self.poll.is_success())
    }
}

/// Result of an exit-standby phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub retry: RetryOutcome,
}

impl ExitOutcome {
    pub fn failure_count(&self) -> u32 {
        self.retry.failure_count()
    }

    pub fn succeeded(&self) -> bool {
        self.retry.succeeded
    }
}

/// Enter and exit standby for one group, polling each activity to a
/// terminal status.
pub struct StandbyWorkflow<'a, F: FleetController + ?Sized> {
    fleet: &'a F,
    group: &'a str,
    poller: BoundedPoller,
    max_exit_attempts: u32,
}

impl<'a, F: FleetController + ?Sized> StandbyWorkflow<'a, F> {
    pub fn new(fleet: &'a F, group: &'a str, poll: PollConfig) -> Self {
        Self {
            fleet,
            group,
            poller: BoundedPoller::new(poll),
            max_exit_attempts: DEFAULT_EXIT_ATTEMPTS,
        }
    }

    /// At least one exit attempt is always made.
    pub fn with_max_exit_attempts(mut self, attempts: u32) -> Self {
        self.max_exit_attempts = attempts.max(1);
        self
    }

    /// Poll until every activity reports `Successful`.
    pub async fn wait_for_activity(&self, activity: &ScalingActivity) -> PollOutcome {
        debug!(
            group = self.group,
            activity_id = %activity.id,
            initial_status = %activity.status_code,
            "waiting for activity to succeed"
        );
        let activity_ids = vec![activity.id.clone()];
        let ids = &activity_ids;

        self.poller
            .run(|| async move {
                let statuses = self.fleet.describe_activity_status(self.group, ids).await?;
                Ok::<_, FleetError>(all_activities_reached(&statuses, ACTIVITY_SUCCESSFUL))
            })
            .await
    }

    /// Move `instances` to standby and wait for the activity.
    ///
    /// A failed call does not stop the phase: the degraded activity is
    /// still polled, which times out and is counted separately.
    pub async fn enter_standby(&self, instances: &InstanceSet) -> EnterOutcome {
        info!(group = self.group, %instances, "attempting to enter standby");

        let (activity, call_error) = match self.fleet.enter_standby(self.group, instances).await {
            Ok(activity) => (activity, None),
            Err(e) => {
                error!(group = self.group, error = %e, "error entering instances into standby");
                (ScalingActivity::degraded(), Some(e.to_string()))
            }
        };

        let poll = self.wait_for_activity(&activity).await;
        if poll.is_success() {
            info!(group = self.group, %instances, "instances now in standby");
        } else {
            warn!(
                group = self.group,
                %instances,
                attempts = poll.attempts(),
                "some or all instances did not enter standby"
            );
        }

        EnterOutcome {
            activity,
            call_error,
            poll,
        }
    }

    /// Return `instances` to service, retrying failed polls.
    pub async fn exit_standby(&self, instances: &InstanceSet) -> ExitOutcome {
        self.exit_standby_with(instances, |reached| reached).await
    }

    /// Like [`exit_standby`](Self::exit_standby), with `is_success`
    /// deciding whether a poll result counts as success.
    ///
    /// A rejected call ends the phase at once; only a poll that follows
    /// an accepted call is retried.
    pub async fn exit_standby_with<S>(&self, instances: &InstanceSet, is_success: S) -> ExitOutcome
    where
        S: Fn(bool) -> bool,
    {
        let is_success = &is_success;
        let max_attempts = self.max_exit_attempts;

        let retry = retry_bounded(max_attempts, |attempt| async move {
            info!(group = self.group, %instances, attempt, max_attempts, "attempting to exit standby");

            let activity = match self.fleet.exit_standby(self.group, instances).await {
                Ok(activity) => activity,
                Err(e) => {
                    error!(group = self.group, error = %e, "error calling exit standby");
                    return Attempt::Abort;
                }
            };

            let poll = self.wait_for_activity(&activity).await;
            if is_success(poll.is_success()) {
                info!(group = self.group, %instances, "instances exited standby");
                Attempt::Succeeded
            } else {
                error!(
                    group = self.group,
                    activity_id = %activity.id,
                    attempt,
                    "instances failed to reach successful status"
                );
                Attempt::Failed
            }
        })
        .await;

        ExitOutcome { retry }
    }
}
