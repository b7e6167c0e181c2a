//! Domain types for a failover verification run.

use std::fmt;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Status code a scaling activity reports once it has completed.
pub const ACTIVITY_SUCCESSFUL: &str = "Successful";

/// Spacing and overall budget for a bounded poll.
///
/// The interval is always non-zero; the constructor refuses to build a
/// config whose iteration budget would divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    timeout: Duration,
}

impl PollConfig {
    /// Create a poll config. Fails fast on a zero interval.
    pub fn new(interval: Duration, timeout: Duration) -> ConfigResult<Self> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self { interval, timeout })
    }

    /// Convenience constructor taking whole seconds.
    pub fn from_secs(interval_secs: u64, timeout_secs: u64) -> ConfigResult<Self> {
        Self::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
    }

    /// Time between predicate invocations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Overall time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of predicate invocations a bounded poll may make:
    /// `floor(timeout / interval)`.
    pub fn iteration_budget(&self) -> u64 {
        let budget = self.timeout.as_nanos() / self.interval.as_nanos();
        u64::try_from(budget).unwrap_or(u64::MAX)
    }
}

/// An HTTP content check: fetch `url` and look for `expected` in the body.
///
/// Built once per run and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentCheck {
    url: String,
    expected: String,
    user: Option<String>,
    password: Option<String>,
    skip_tls_verify: bool,
}

impl ContentCheck {
    /// Create a check without credentials that verifies certificates.
    pub fn new(url: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expected: expected.into(),
            user: None,
            password: None,
            skip_tls_verify: false,
        }
    }

    /// Attach basic-auth credentials. An empty user disables auth.
    pub fn with_basic_auth(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    /// Opt in to skipping server certificate validation.
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Credentials to send, if a non-empty user was configured.
    pub fn basic_auth(&self) -> Option<(&str, Option<&str>)> {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => Some((user, self.password.as_deref())),
            _ => None,
        }
    }

    pub fn skip_tls_verify(&self) -> bool {
        self.skip_tls_verify
    }
}

impl fmt::Debug for ContentCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCheck")
            .field("url", &self.url)
            .field("expected", &self.expected)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

/// Ordered instance identifiers of a managed group.
///
/// Order carries no meaning for correctness; it is kept as reported so
/// logs and tests are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceSet(Vec<String>);

impl InstanceSet {
    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for InstanceSet {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl FromIterator<String> for InstanceSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for InstanceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Per-instance lifecycle state as reported by the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Pending,
    InService,
    EnteringStandby,
    Standby,
    Terminating,
    Other(String),
}

impl LifecycleState {
    /// Whether the instance is serving traffic.
    pub fn is_in_service(&self) -> bool {
        matches!(self, Self::InService)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::InService => "InService",
            Self::EnteringStandby => "EnteringStandby",
            Self::Standby => "Standby",
            Self::Terminating => "Terminating",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for LifecycleState {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "InService" => Self::InService,
            "EnteringStandby" => Self::EnteringStandby,
            "Standby" => Self::Standby,
            "Terminating" => Self::Terminating,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An instance id paired with its lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetInstance {
    pub id: String,
    pub lifecycle_state: LifecycleState,
}

impl FleetInstance {
    pub fn new(id: impl Into<String>, state: impl Into<LifecycleState>) -> Self {
        Self {
            id: id.into(),
            lifecycle_state: state.into(),
        }
    }
}

/// Whether every instance reports `InService`.
///
/// An empty group is trivially in service.
pub fn all_in_service(instances: &[FleetInstance]) -> bool {
    instances.iter().all(|i| i.lifecycle_state.is_in_service())
}

/// The ids of `instances`, in reported order.
pub fn instance_ids(instances: &[FleetInstance]) -> InstanceSet {
    instances.iter().map(|i| i.id.clone()).collect()
}

/// One asynchronous state-change operation started by the fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingActivity {
    pub id: String,
    pub status_code: String,
}

impl ScalingActivity {
    pub fn new(id: impl Into<String>, status_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status_code: status_code.into(),
        }
    }

    /// Placeholder used when the fleet call that should have started an
    /// activity failed. Polling it never reports success.
    pub fn degraded() -> Self {
        Self::new("", "")
    }

    pub fn is_degraded(&self) -> bool {
        self.id.is_empty()
    }
}
