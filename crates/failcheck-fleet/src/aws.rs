//! AWS Auto Scaling backed fleet.

use async_trait::async_trait;
use aws_sdk_autoscaling::Client;
use aws_sdk_autoscaling::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_autoscaling::error::DisplayErrorContext;
use aws_sdk_autoscaling::types::{Activity, Instance};
use tracing::{debug, warn};

use failcheck_core::config::{ENV_ACCESS_KEY_ID, ENV_REGION, ENV_SECRET_ACCESS_KEY};
use failcheck_core::{
    ConfigError, ConfigResult, FleetInstance, FleetSettings, InstanceSet, ScalingActivity,
};

use crate::controller::FleetController;
use crate::error::{FleetError, FleetResult};

/// Fleet backed by an Auto Scaling group.
#[derive(Debug, Clone)]
pub struct AwsFleet {
    client: Client,
}

impl AwsFleet {
    /// Build a client from explicit settings rather than the SDK's
    /// default provider chain.
    pub fn from_settings(settings: &FleetSettings) -> ConfigResult<Self> {
        let region = required(&settings.region, ENV_REGION)?;
        let access_key_id = required(&settings.access_key_id, ENV_ACCESS_KEY_ID)?;
        let secret_access_key = required(&settings.secret_access_key, ENV_SECRET_ACCESS_KEY)?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            settings.session_token.clone(),
            None,
            "failcheck",
        );
        let config = aws_sdk_autoscaling::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .build();

        Ok(Self::from_client(Client::from_conf(config)))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn required(value: &Option<String>, key: &'static str) -> ConfigResult<String> {
    value.clone().ok_or(ConfigError::Missing(vec![key]))
}

/// Stands in for a status code the API left out. Never `Successful`.
const UNKNOWN_STATUS: &str = "Unknown";

fn status_of(activity: &Activity) -> &str {
    activity
        .status_code()
        .map(|code| code.as_str())
        .unwrap_or(UNKNOWN_STATUS)
}

/// Only the first activity of a standby call is tracked.
fn first_activity(activities: &[Activity], operation: &'static str) -> FleetResult<ScalingActivity> {
    let activity = activities
        .first()
        .ok_or(FleetError::MissingActivity(operation))?;
    let id = activity
        .activity_id()
        .filter(|id| !id.is_empty())
        .ok_or(FleetError::MissingActivity(operation))?;
    Ok(ScalingActivity::new(id, status_of(activity)))
}

/// Instances the API reports without an id cannot be moved; they are
/// dropped.
fn fleet_instance(instance: &Instance) -> Option<FleetInstance> {
    let id = instance.instance_id().filter(|id| !id.is_empty())?;
    let state = instance
        .lifecycle_state()
        .map(|state| state.as_str())
        .unwrap_or(UNKNOWN_STATUS);
    Some(FleetInstance::new(id, state))
}

#[async_trait]
impl FleetController for AwsFleet {
    async fn describe_instances(&self, group: &str) -> FleetResult<Vec<FleetInstance>> {
        let output = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group)
            .max_records(1)
            .send()
            .await
            .map_err(|e| FleetError::Query {
                group: group.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let asg = output
            .auto_scaling_groups()
            .first()
            .ok_or_else(|| FleetError::GroupNotFound(group.to_string()))?;

        let reported = asg.instances();
        let instances: Vec<FleetInstance> = reported.iter().filter_map(fleet_instance).collect();
        if instances.len() < reported.len() {
            warn!(
                %group,
                skipped = reported.len() - instances.len(),
                "ignoring instances reported without an id"
            );
        }
        debug!(%group, count = instances.len(), "described group");
        Ok(instances)
    }

    async fn enter_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity> {
        debug!(%group, %instances, should_decrement_desired_capacity = true, "EnterStandby request");
        let output = self
            .client
            .enter_standby()
            .auto_scaling_group_name(group)
            .set_instance_ids(Some(instances.ids().to_vec()))
            .should_decrement_desired_capacity(true)
            .send()
            .await
            .map_err(|e| FleetError::Mutation {
                operation: "EnterStandby",
                group: group.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        first_activity(output.activities(), "EnterStandby")
    }

    async fn exit_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity> {
        debug!(%group, %instances, "ExitStandby request");
        let output = self
            .client
            .exit_standby()
            .auto_scaling_group_name(group)
            .set_instance_ids(Some(instances.ids().to_vec()))
            .send()
            .await
            .map_err(|e| FleetError::Mutation {
                operation: "ExitStandby",
                group: group.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        first_activity(output.activities(), "ExitStandby")
    }

    async fn describe_activity_status(
        &self,
        group: &str,
        activity_ids: &[String],
    ) -> FleetResult<Vec<String>> {
        let ids: Vec<String> = activity_ids
            .iter()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect();
        // Without ids the API would describe the group's latest activities.
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let max_records = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let output = self
            .client
            .describe_scaling_activities()
            .auto_scaling_group_name(group)
            .set_activity_ids(Some(ids))
            .max_records(max_records)
            .send()
            .await
            .map_err(|e| FleetError::Describe(DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .activities()
            .iter()
            .map(|a| status_of(a).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_autoscaling::types::{LifecycleState, ScalingActivityStatusCode};

    use super::*;

    #[test]
    fn first_activity_reads_id_and_status() {
        let activities = vec![
            Activity::builder()
                .activity_id("act-1")
                .status_code(ScalingActivityStatusCode::InProgress)
                .build(),
            Activity::builder().activity_id("act-2").build(),
        ];
        let activity = first_activity(&activities, "EnterStandby").unwrap();
        assert_eq!(activity.id, "act-1");
        assert_eq!(activity.status_code, "InProgress");
    }

    #[test]
    fn first_activity_without_id_is_missing() {
        let activities = vec![
            Activity::builder()
                .status_code(ScalingActivityStatusCode::Successful)
                .build(),
        ];
        let err = first_activity(&activities, "ExitStandby").unwrap_err();
        assert!(matches!(err, FleetError::MissingActivity("ExitStandby")));

        let err = first_activity(&[], "EnterStandby").unwrap_err();
        assert!(matches!(err, FleetError::MissingActivity("EnterStandby")));
    }

    #[test]
    fn missing_status_code_never_reads_successful() {
        let activity = Activity::builder().activity_id("act-1").build();
        assert_eq!(status_of(&activity), UNKNOWN_STATUS);
        assert_ne!(status_of(&activity), failcheck_core::ACTIVITY_SUCCESSFUL);
    }

    #[test]
    fn instances_without_id_are_dropped() {
        let with_id = Instance::builder()
            .instance_id("i-1")
            .lifecycle_state(LifecycleState::InService)
            .build();
        let instance = fleet_instance(&with_id).unwrap();
        assert_eq!(instance.id, "i-1");
        assert!(instance.lifecycle_state.is_in_service());

        let no_state = Instance::builder().instance_id("i-2").build();
        assert!(!fleet_instance(&no_state).unwrap().lifecycle_state.is_in_service());

        let no_id = Instance::builder()
            .lifecycle_state(LifecycleState::InService)
            .build();
        assert!(fleet_instance(&no_id).is_none());
    }

    #[test]
    fn from_settings_requires_credentials() {
        let settings = FleetSettings {
            group_name: Some("web-asg".into()),
            region: Some("eu-west-1".into()),
            ..Default::default()
        };
        let err = AwsFleet::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(keys) if keys == vec![ENV_ACCESS_KEY_ID]));
    }

    #[tokio::test]
    async fn from_settings_builds_client() {
        let settings = FleetSettings {
            group_name: Some("web-asg".into()),
            region: Some("eu-west-1".into()),
            access_key_id: Some("AKIA123".into()),
            secret_access_key: Some("secret".into()),
            session_token: None,
        };
        assert!(AwsFleet::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn degraded_activity_ids_skip_the_api() {
        let settings = FleetSettings {
            group_name: Some("web-asg".into()),
            region: Some("eu-west-1".into()),
            access_key_id: Some("AKIA123".into()),
            secret_access_key: Some("secret".into()),
            session_token: None,
        };
        let fleet = AwsFleet::from_settings(&settings).unwrap();
        let statuses = fleet
            .describe_activity_status("web-asg", &[String::new()])
            .await
            .unwrap();
        assert!(statuses.is_empty());
    }
}
