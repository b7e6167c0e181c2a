//! failcheck-fleet — the fleet capability consumed by the standby workflow.
//!
//! The workflow never talks to a cloud SDK directly. It goes through the
//! [`FleetController`] trait: describe a group, move instances in and out
//! of standby, and read back the status of the scaling activities those
//! moves started.
//!
//! - **`aws`** — [`AwsFleet`], backed by the AWS Auto Scaling API
//! - **`memory`** — [`InMemoryFleet`], a scripted fake (feature `testing`)

pub mod aws;
pub mod controller;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use aws::AwsFleet;
pub use controller::{FleetController, all_activities_reached};
pub use error::{FleetError, FleetResult};
#[cfg(any(test, feature = "testing"))]
pub use memory::{FleetCalls, InMemoryFleet};
