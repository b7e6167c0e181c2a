//! failcheck-core — shared types and control-flow primitives for failcheck.
//!
//! Everything the standby workflow and the content probe agree on lives
//! here: the poll budget, the content check description, the fleet data
//! model, and the two composable retry primitives.
//!
//! # Primitives
//!
//! ```text
//! BoundedPoller   predicate() → Ok(true) | Ok(false) | Err
//!                 at most floor(timeout / interval) invocations,
//!                 aborts on the first error
//!
//! retry_bounded   attempt(n) → Succeeded | Failed | Abort
//!                 at most max_attempts attempts, counts failures
//! ```
//!
//! The exit-standby workflow nests a `BoundedPoller` inside
//! `retry_bounded`; each stays independently testable.

pub mod config;
pub mod error;
pub mod poll;
pub mod retry;
pub mod types;

pub use config::{CheckFileConfig, FileConfig, FleetFileConfig, FleetSettings};
pub use error::{ConfigError, ConfigResult};
pub use poll::{BoundedPoller, PollOutcome};
pub use retry::{Attempt, RetryOutcome, retry_bounded};
pub use types::*;
