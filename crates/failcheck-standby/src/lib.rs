//! failcheck-standby — drives a managed group through a failover check.
//!
//! # Components
//!
//! - **`workflow`** — enter/exit standby, each polled to a terminal
//!   activity status; exit retries the whole call-then-poll up to a
//!   fixed number of attempts
//! - **`orchestrator`** — the end-to-end run: standby, failover content,
//!   restore to service, primary content
//!
//! # Exit status
//!
//! Failures are counted, not short-circuited. Each phase contributes a
//! non-negative number of failure units and the run's result is their
//! sum; zero means failover and restoration were both verified. Only a
//! missing baseline (the group cannot be described) aborts a run.

pub mod orchestrator;
pub mod workflow;

pub use orchestrator::{Orchestrator, RunError, RunPlan, RunReport};
pub use workflow::{DEFAULT_EXIT_ATTEMPTS, EnterOutcome, ExitOutcome, StandbyWorkflow};
