//! End-to-end runs against the in-memory fleet.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use failcheck_core::{ContentCheck, LifecycleState, PollConfig};
use failcheck_fleet::InMemoryFleet;
use failcheck_probe::{Probe, ProbeResult};
use failcheck_standby::{Orchestrator, RunError, RunPlan, RunReport};

const GROUP: &str = "web-asg";
const FAILOVER_URL: &str = "https://maintenance.example.com/";
const PRIMARY_URL: &str = "https://www.example.com/";

/// Answers each URL with a fixed match result.
struct StaticProbe {
    matches: HashMap<String, bool>,
    calls: AtomicUsize,
}

impl StaticProbe {
    fn new(failover: bool, primary: bool) -> Arc<Self> {
        Arc::new(Self {
            matches: HashMap::from([
                (FAILOVER_URL.to_string(), failover),
                (PRIMARY_URL.to_string(), primary),
            ]),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for StaticProbe {
    async fn probe(&self, check: &ContentCheck) -> ProbeResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.matches.get(check.url()).copied().unwrap_or(false))
    }
}

fn fleet() -> InMemoryFleet {
    InMemoryFleet::new(GROUP, ["instance1", "instance2", "instance3"])
}

fn plan() -> RunPlan {
    RunPlan::new(
        GROUP,
        PollConfig::from_secs(1, 5).unwrap(),
        ContentCheck::new(FAILOVER_URL, "Maintenance"),
    )
    .with_primary(ContentCheck::new(PRIMARY_URL, "Welcome"))
}

async fn run(fleet: Arc<InMemoryFleet>, probe: Arc<StaticProbe>, plan: RunPlan) -> RunReport {
    Orchestrator::new(fleet, probe, plan).run().await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn full_success_exits_zero() {
    let fleet = Arc::new(fleet());
    let report = run(fleet.clone(), StaticProbe::new(true, true), plan()).await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.entry, 0);
    assert_eq!(report.failover_content, Some(0));
    assert_eq!(report.restore_rounds, 1);
    assert_eq!(report.primary_content, Some(0));
    assert_eq!(fleet.calls().enter_standby, 1);
    assert_eq!(fleet.calls().exit_standby, 1);
    assert_eq!(fleet.states(), vec![LifecycleState::InService; 3]);
}

#[tokio::test(start_paused = true)]
async fn enter_call_failure_still_counts_when_later_phases_pass() {
    let fleet = Arc::new(fleet().failing_enter());
    let probe = StaticProbe::new(true, true);
    let report = run(fleet.clone(), probe.clone(), plan()).await;

    assert!(report.total() >= 1);
    // Call failure plus the degraded activity's poll timeout.
    assert_eq!(report.entry, 2);
    assert_eq!(report.failover_content, None);
    assert_eq!(report.restore_rounds, 0);
    assert_eq!(report.primary_content, Some(0));
    assert_eq!(report.total(), 2);
    // Only the primary poll probed.
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failover_content_mismatch_counts_one() {
    let fleet = Arc::new(fleet());
    let report = run(fleet, StaticProbe::new(false, true), plan()).await;

    assert_eq!(report.failover_content, Some(1));
    assert_eq!(report.total(), 1);
}

#[tokio::test(start_paused = true)]
async fn primary_content_mismatch_counts_one() {
    let fleet = Arc::new(fleet());
    let report = run(fleet, StaticProbe::new(true, false), plan()).await;

    assert_eq!(report.primary_content, Some(1));
    assert_eq!(report.total(), 1);
}

#[tokio::test(start_paused = true)]
async fn primary_check_skipped_without_url() {
    let fleet = Arc::new(fleet());
    let plan = RunPlan::new(
        GROUP,
        PollConfig::from_secs(1, 5).unwrap(),
        ContentCheck::new(FAILOVER_URL, "Maintenance"),
    );
    let report = run(fleet, StaticProbe::new(true, false), plan).await;

    assert_eq!(report.primary_content, None);
    assert_eq!(report.total(), 0);
}

#[tokio::test(start_paused = true)]
async fn exit_poll_failures_accumulate() {
    // Enter's poll succeeds, every exit poll fails. The fake still moves
    // instances back to service on the accepted exit call.
    let fleet = Arc::new(fleet().with_activity_statuses(["Successful"], "Failed"));
    let report = run(fleet.clone(), StaticProbe::new(true, true), plan()).await;

    assert_eq!(report.entry, 0);
    assert_eq!(report.restore_rounds, 1);
    assert_eq!(report.restore, 3);
    assert_eq!(report.total(), 3);
    assert_eq!(fleet.calls().exit_standby, 3);
}

#[tokio::test(start_paused = true)]
async fn restore_loop_retries_until_in_service() {
    // Baseline, then two describes still in standby after exits.
    let fleet = Arc::new(fleet().with_lifecycle_script(["InService", "Standby", "Standby"]));
    let report = run(fleet.clone(), StaticProbe::new(true, true), plan()).await;

    assert_eq!(report.restore_rounds, 2);
    assert_eq!(report.restore, 0);
    assert_eq!(report.total(), 0);
    assert_eq!(fleet.calls().exit_standby, 2);
}

#[tokio::test(start_paused = true)]
async fn restore_cap_is_explicit_and_counted() {
    let fleet = Arc::new(fleet().failing_exit());
    let plan = plan().with_max_restore_rounds(Some(2));
    let report = run(fleet.clone(), StaticProbe::new(true, true), plan).await;

    // One unit per rejected exit call plus one for hitting the cap.
    assert_eq!(report.restore_rounds, 2);
    assert!(report.restore_capped);
    assert_eq!(report.restore, 3);
    assert_eq!(report.total(), 3);
    assert_eq!(fleet.calls().exit_standby, 2);
}

#[tokio::test(start_paused = true)]
async fn baseline_query_failure_is_fatal() {
    let fleet = Arc::new(fleet().failing_describe_instances());
    let probe = StaticProbe::new(true, true);
    let err = Orchestrator::new(fleet.clone(), probe, plan())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::FleetQuery(_)));
    assert_eq!(fleet.calls().enter_standby, 0);
}

#[tokio::test(start_paused = true)]
async fn empty_group_is_fatal() {
    let fleet = Arc::new(InMemoryFleet::new(GROUP, Vec::<String>::new()));
    let err = Orchestrator::new(fleet, StaticProbe::new(true, true), plan())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::EmptyGroup(g) if g == GROUP));
}

#[tokio::test(start_paused = true)]
async fn zero_exit_attempts_still_restores() {
    let fleet = Arc::new(fleet());
    let mut plan = plan();
    plan.max_exit_attempts = 0;
    let report = run(fleet.clone(), StaticProbe::new(true, true), plan).await;

    assert_eq!(report.total(), 0);
    assert_eq!(report.restore_rounds, 1);
    assert_eq!(fleet.calls().exit_standby, 1);
    assert_eq!(fleet.states(), vec![LifecycleState::InService; 3]);

    let plan = RunPlan::new(
        GROUP,
        PollConfig::from_secs(1, 5).unwrap(),
        ContentCheck::new(FAILOVER_URL, "Maintenance"),
    )
    .with_max_exit_attempts(0);
    assert_eq!(plan.max_exit_attempts, 1);
}
