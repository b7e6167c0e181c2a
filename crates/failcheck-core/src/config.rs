//! failcheck.toml parsing and fleet settings resolution.
//!
//! Settings are layered: config file, then environment, then explicit
//! command-line overrides.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};

pub const ENV_GROUP_NAME: &str = "ASG_NAME";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub fleet: Option<FleetFileConfig>,
    pub check: Option<CheckFileConfig>,
}

#[derive(Clone, Default, Deserialize)]
pub struct FleetFileConfig {
    pub group_name: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl fmt::Debug for FleetFileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetFileConfig")
            .field("group_name", &self.group_name)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckFileConfig {
    pub url: Option<String>,
    pub content: Option<String>,
    pub primary_url: Option<String>,
    pub primary_content: Option<String>,
    pub poll_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

/// Resolved fleet target and credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FleetSettings {
    pub group_name: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl FleetSettings {
    /// Layer the config file, then `env`, then `group_override`.
    ///
    /// Empty values never override a non-empty lower layer.
    pub fn resolve<E>(file: Option<&FleetFileConfig>, env: E, group_override: Option<&str>) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = file.cloned().unwrap_or_default();
        let pick = |from_file: Option<String>, key: &str| {
            non_empty(env(key)).or_else(|| non_empty(from_file))
        };

        Self {
            group_name: non_empty(group_override.map(str::to_string))
                .or_else(|| pick(file.group_name, ENV_GROUP_NAME)),
            region: pick(file.region, ENV_REGION),
            access_key_id: pick(file.access_key_id, ENV_ACCESS_KEY_ID),
            secret_access_key: pick(file.secret_access_key, ENV_SECRET_ACCESS_KEY),
            session_token: pick(file.session_token, ENV_SESSION_TOKEN),
        }
    }

    /// Resolve against the process environment.
    pub fn from_env(file: Option<&FleetFileConfig>, group_override: Option<&str>) -> Self {
        Self::resolve(file, |key| std::env::var(key).ok(), group_override)
    }

    /// Check that everything needed to talk to the fleet is present.
    pub fn validate(&self) -> ConfigResult<()> {
        info!("checking fleet credentials");
        let mut missing = Vec::new();
        if self.group_name.is_none() {
            missing.push(ENV_GROUP_NAME);
        }
        if self.region.is_none() {
            missing.push(ENV_REGION);
        }
        if self.access_key_id.is_none() {
            missing.push(ENV_ACCESS_KEY_ID);
        }
        if self.secret_access_key.is_none() {
            missing.push(ENV_SECRET_ACCESS_KEY);
        }

        if missing.is_empty() {
            info!("fleet credentials ok");
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    /// The group name, once validated.
    pub fn group(&self) -> ConfigResult<&str> {
        self.group_name
            .as_deref()
            .ok_or(ConfigError::Missing(vec![ENV_GROUP_NAME]))
    }
}

impl fmt::Debug for FleetSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetSettings")
            .field("group_name", &self.group_name)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}
