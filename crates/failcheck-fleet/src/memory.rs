//! Scripted in-memory fleet.
//!
//! Instances move to `Standby` on a successful enter and back to
//! `InService` on a successful exit. Lifecycle and activity status
//! scripts override what describe calls report, one entry per call.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use failcheck_core::{ACTIVITY_SUCCESSFUL, FleetInstance, InstanceSet, LifecycleState, ScalingActivity};

use crate::controller::FleetController;
use crate::error::{FleetError, FleetResult};

/// Call counters, for asserting on workflow behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetCalls {
    pub describe_instances: usize,
    pub enter_standby: usize,
    pub exit_standby: usize,
    pub describe_activities: usize,
}

#[derive(Debug)]
struct Inner {
    instances: Vec<FleetInstance>,
    lifecycle_script: VecDeque<LifecycleState>,
    activity_script: VecDeque<String>,
    activity_default: String,
    fail_describe_instances: bool,
    fail_enter: bool,
    fail_exit: bool,
    fail_describe_activities: bool,
    next_activity: u64,
    calls: FleetCalls,
}

#[derive(Debug)]
pub struct InMemoryFleet {
    group: String,
    inner: Mutex<Inner>,
}

impl InMemoryFleet {
    /// A group whose instances are all `InService` and whose activities
    /// all succeed.
    pub fn new<I, S>(group: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instances = ids
            .into_iter()
            .map(|id| FleetInstance::new(id, LifecycleState::InService))
            .collect();
        Self {
            group: group.to_string(),
            inner: Mutex::new(Inner {
                instances,
                lifecycle_script: VecDeque::new(),
                activity_script: VecDeque::new(),
                activity_default: ACTIVITY_SUCCESSFUL.to_string(),
                fail_describe_instances: false,
                fail_enter: false,
                fail_exit: false,
                fail_describe_activities: false,
                next_activity: 0,
                calls: FleetCalls::default(),
            }),
        }
    }

    /// States reported for every instance on the next describe calls,
    /// one entry per call, before falling back to the tracked state.
    pub fn with_lifecycle_script<I, S>(self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lock().lifecycle_script = states
            .into_iter()
            .map(|s| LifecycleState::from(s.as_ref()))
            .collect();
        self
    }

    /// Status codes reported on the next activity describes, one entry per
    /// call, then `then` forever.
    pub fn with_activity_statuses<I, S>(self, script: I, then: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut inner = self.lock();
            inner.activity_script = script.into_iter().map(Into::into).collect();
            inner.activity_default = then.to_string();
        }
        self
    }

    pub fn failing_describe_instances(self) -> Self {
        self.lock().fail_describe_instances = true;
        self
    }

    pub fn failing_enter(self) -> Self {
        self.lock().fail_enter = true;
        self
    }

    pub fn failing_exit(self) -> Self {
        self.lock().fail_exit = true;
        self
    }

    pub fn failing_describe_activities(self) -> Self {
        self.lock().fail_describe_activities = true;
        self
    }

    pub fn calls(&self) -> FleetCalls {
        self.lock().calls
    }

    /// Tracked lifecycle state of every instance, ignoring scripts.
    pub fn states(&self) -> Vec<LifecycleState> {
        self.lock()
            .instances
            .iter()
            .map(|i| i.lifecycle_state.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_group(&self, group: &str) -> FleetResult<()> {
        if group == self.group {
            Ok(())
        } else {
            Err(FleetError::GroupNotFound(group.to_string()))
        }
    }
}

impl Inner {
    fn start_activity(&mut self) -> ScalingActivity {
        self.next_activity += 1;
        ScalingActivity::new(format!("activity-{}", self.next_activity), "InProgress")
    }

    fn set_state(&mut self, targets: &InstanceSet, state: LifecycleState) {
        for instance in &mut self.instances {
            if targets.ids().contains(&instance.id) {
                instance.lifecycle_state = state.clone();
            }
        }
    }
}

#[async_trait]
impl FleetController for InMemoryFleet {
    async fn describe_instances(&self, group: &str) -> FleetResult<Vec<FleetInstance>> {
        let mut inner = self.lock();
        inner.calls.describe_instances += 1;
        if inner.fail_describe_instances {
            return Err(FleetError::Query {
                group: group.to_string(),
                message: "scripted describe failure".into(),
            });
        }
        self.check_group(group)?;

        match inner.lifecycle_script.pop_front() {
            Some(state) => Ok(inner
                .instances
                .iter()
                .map(|i| FleetInstance::new(i.id.clone(), state.clone()))
                .collect()),
            None => Ok(inner.instances.clone()),
        }
    }

    async fn enter_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity> {
        let mut inner = self.lock();
        inner.calls.enter_standby += 1;
        if inner.fail_enter {
            return Err(FleetError::Mutation {
                operation: "EnterStandby",
                group: group.to_string(),
                message: "scripted enter failure".into(),
            });
        }
        self.check_group(group)?;
        inner.set_state(instances, LifecycleState::Standby);
        Ok(inner.start_activity())
    }

    async fn exit_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity> {
        let mut inner = self.lock();
        inner.calls.exit_standby += 1;
        if inner.fail_exit {
            return Err(FleetError::Mutation {
                operation: "ExitStandby",
                group: group.to_string(),
                message: "scripted exit failure".into(),
            });
        }
        self.check_group(group)?;
        inner.set_state(instances, LifecycleState::InService);
        Ok(inner.start_activity())
    }

    async fn describe_activity_status(
        &self,
        _group: &str,
        activity_ids: &[String],
    ) -> FleetResult<Vec<String>> {
        let mut inner = self.lock();
        inner.calls.describe_activities += 1;
        if inner.fail_describe_activities {
            return Err(FleetError::Describe("scripted describe failure".into()));
        }

        let known = activity_ids.iter().filter(|id| !id.is_empty()).count();
        if known == 0 {
            return Ok(Vec::new());
        }
        let status = inner
            .activity_script
            .pop_front()
            .unwrap_or_else(|| inner.activity_default.clone());
        Ok(vec![status; known])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> InstanceSet {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn lists_instances_in_order() {
        let fleet = InMemoryFleet::new("asg", ["i-1", "i-2", "i-3"]);
        let listed = fleet.list_instances("asg").await.unwrap();
        assert_eq!(listed, ids(&["i-1", "i-2", "i-3"]));
    }

    #[tokio::test]
    async fn unknown_group_is_not_found() {
        let fleet = InMemoryFleet::new("asg", ["i-1"]);
        let err = fleet.describe_instances("other").await.unwrap_err();
        assert!(matches!(err, FleetError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn standby_round_trip_tracks_state() {
        let fleet = InMemoryFleet::new("asg", ["i-1", "i-2"]);
        let targets = ids(&["i-1", "i-2"]);

        let activity = fleet.enter_standby("asg", &targets).await.unwrap();
        assert_eq!(activity.id, "activity-1");
        assert_eq!(fleet.states(), vec![LifecycleState::Standby; 2]);

        fleet.exit_standby("asg", &targets).await.unwrap();
        assert_eq!(fleet.states(), vec![LifecycleState::InService; 2]);
        assert_eq!(fleet.calls().enter_standby, 1);
        assert_eq!(fleet.calls().exit_standby, 1);
    }

    #[tokio::test]
    async fn lifecycle_script_overrides_then_falls_back() {
        let fleet = InMemoryFleet::new("asg", ["i-1", "i-2"]).with_lifecycle_script(["Pending"]);

        let first = fleet.describe_instances("asg").await.unwrap();
        assert!(first.iter().all(|i| i.lifecycle_state == LifecycleState::Pending));

        let second = fleet.describe_instances("asg").await.unwrap();
        assert!(second.iter().all(|i| i.lifecycle_state.is_in_service()));
    }

    #[tokio::test]
    async fn activity_script_then_default() {
        let fleet = InMemoryFleet::new("asg", ["i-1"]).with_activity_statuses(["InProgress"], "Failed");
        let ids = vec!["activity-1".to_string()];

        assert_eq!(fleet.describe_activity_status("asg", &ids).await.unwrap(), ["InProgress"]);
        assert_eq!(fleet.describe_activity_status("asg", &ids).await.unwrap(), ["Failed"]);
        assert!(fleet.describe_activity_status("asg", &[String::new()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_mutations_leave_state_alone() {
        let fleet = InMemoryFleet::new("asg", ["i-1"]).failing_enter();
        assert!(fleet.enter_standby("asg", &ids(&["i-1"])).await.is_err());
        assert_eq!(fleet.states(), vec![LifecycleState::InService]);
    }
}
