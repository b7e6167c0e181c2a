//! The fleet capability trait.

use async_trait::async_trait;

use failcheck_core::{FleetInstance, InstanceSet, ScalingActivity, instance_ids};

use crate::error::FleetResult;

/// Operations the standby workflow needs from a managed instance group.
///
/// Standby transitions are asynchronous on the fleet side: each call
/// returns the activity it started, which the caller polls through
/// [`describe_activity_status`](FleetController::describe_activity_status).
#[async_trait]
pub trait FleetController: Send + Sync {
    /// Instance ids and lifecycle states of `group`, in reported order.
    async fn describe_instances(&self, group: &str) -> FleetResult<Vec<FleetInstance>>;

    /// Move `instances` to standby, decrementing desired capacity.
    async fn enter_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity>;

    /// Return `instances` from standby to service.
    async fn exit_standby(
        &self,
        group: &str,
        instances: &InstanceSet,
    ) -> FleetResult<ScalingActivity>;

    /// Status codes of the given activities.
    async fn describe_activity_status(
        &self,
        group: &str,
        activity_ids: &[String],
    ) -> FleetResult<Vec<String>>;

    /// The group's instance ids.
    async fn list_instances(&self, group: &str) -> FleetResult<InstanceSet> {
        Ok(instance_ids(&self.describe_instances(group).await?))
    }
}

/// Whether every reported activity has reached `target`.
///
/// There is no partial success: one activity off target means not
/// finished. An empty report means nothing was confirmed, so it is not
/// finished either.
pub fn all_activities_reached(statuses: &[String], target: &str) -> bool {
    !statuses.is_empty() && statuses.iter().all(|s| s == target)
}
