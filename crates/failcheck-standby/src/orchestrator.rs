//! Orchestrator — sequences a full failover verification run.
//!
//! 1. describe the group for a baseline instance list (fatal on error)
//! 2. enter standby
//! 3. if standby was reached, poll the failover URL for its content
//! 4. exit standby until every instance reports `InService`
//! 5. poll the primary URL for its content
//!
//! Step 4 has no bound unless the plan sets `max_restore_rounds`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use failcheck_core::{ContentCheck, PollConfig, all_in_service, instance_ids};
use failcheck_fleet::{FleetController, FleetError};
use failcheck_probe::{Probe, poll_for_content};

use crate::workflow::{DEFAULT_EXIT_ATTEMPTS, StandbyWorkflow};

/// Errors that abort a run. Everything else is counted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not get instances in group: {0}")]
    FleetQuery(#[from] FleetError),

    #[error("group {0} has no instances")]
    EmptyGroup(String),
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub group: String,
    pub poll: PollConfig,
    /// Content expected while the group is in standby.
    pub failover: ContentCheck,
    /// Content expected once the group is back; skipped when `None`.
    pub primary: Option<ContentCheck>,
    /// Cap on restore rounds. `None` retries until every instance is
    /// back in service.
    pub max_restore_rounds: Option<u32>,
    /// Exit attempts per restore round; a value below 1 is treated as 1.
    pub max_exit_attempts: u32,
}

impl RunPlan {
    pub fn new(group: impl Into<String>, poll: PollConfig, failover: ContentCheck) -> Self {
        Self {
            group: group.into(),
            poll,
            failover,
            primary: None,
            max_restore_rounds: None,
            max_exit_attempts: DEFAULT_EXIT_ATTEMPTS,
        }
    }

    pub fn with_primary(mut self, primary: ContentCheck) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn with_max_restore_rounds(mut self, rounds: Option<u32>) -> Self {
        self.max_restore_rounds = rounds;
        self
    }

    pub fn with_max_exit_attempts(mut self, attempts: u32) -> Self {
        self.max_exit_attempts = attempts.max(1);
        self
    }
}

/// Failure units per phase. `None` marks a phase that did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entry: u32,
    pub failover_content: Option<u32>,
    pub restore: u32,
    pub restore_rounds: u32,
    pub restore_capped: bool,
    pub primary_content: Option<u32>,
}

impl RunReport {
    /// The cumulative exit code: 0 means fully verified.
    pub fn total(&self) -> u32 {
        self.entry
            + self.failover_content.unwrap_or(0)
            + self.restore
            + self.primary_content.unwrap_or(0)
    }
}

pub struct Orchestrator<F: ?Sized, P: ?Sized> {
    fleet: Arc<F>,
    probe: Arc<P>,
    plan: RunPlan,
}

impl<F, P> Orchestrator<F, P>
where
    F: FleetController + ?Sized,
    P: Probe + ?Sized + 'static,
{
    pub fn new(fleet: Arc<F>, probe: Arc<P>, plan: RunPlan) -> Self {
        Self { fleet, probe, plan }
    }

    pub async fn run(&self) -> Result<RunReport, RunError> {
        let plan = &self.plan;
        let group = plan.group.as_str();
        let mut report = RunReport::default();

        let baseline = self.fleet.describe_instances(group).await?;
        let instances = instance_ids(&baseline);
        if instances.is_empty() {
            return Err(RunError::EmptyGroup(plan.group.clone()));
        }
        info!(%group, %instances, "instances in group");

        let workflow = StandbyWorkflow::new(self.fleet.as_ref(), group, plan.poll)
            .with_max_exit_attempts(plan.max_exit_attempts);

        let entered = workflow.enter_standby(&instances).await;
        report.entry = entered.failure_count();

        if report.entry == 0 {
            let outcome =
                poll_for_content(self.probe.clone(), plan.failover.clone(), plan.poll).await;
            report.failover_content = Some(outcome.failure_count());
        } else {
            warn!(%group, "standby not confirmed, skipping failover content check");
        }

        loop {
            let current = self.fleet.describe_instances(group).await?;
            if all_in_service(&current) {
                info!(%group, "all instances now in service");
                break;
            }
            info!(%group, ?current, "some instances not in service");

            if let Some(max) = plan.max_restore_rounds {
                if report.restore_rounds >= max {
                    error!(%group, rounds = max, "instances still out of service after restore cap");
                    report.restore += 1;
                    report.restore_capped = true;
                    break;
                }
            }

            report.restore_rounds += 1;
            report.restore += workflow.exit_standby(&instances).await.failure_count();
        }

        match &plan.primary {
            Some(primary) => {
                let outcome =
                    poll_for_content(self.probe.clone(), primary.clone(), plan.poll).await;
                report.primary_content = Some(outcome.failure_count());
            }
            None => info!("no primary url configured, skipping restoration content check"),
        }

        info!(
            %group,
            entry = report.entry,
            failover_content = ?report.failover_content,
            restore = report.restore,
            restore_rounds = report.restore_rounds,
            primary_content = ?report.primary_content,
            exit_code = report.total(),
            "finished"
        );
        Ok(report)
    }
}
