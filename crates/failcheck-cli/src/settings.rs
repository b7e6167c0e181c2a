//! Turns flags and the config file into a run plan.
//!
//! Flags win over the `[check]` section of the config file, which wins
//! over the built-in defaults.

use failcheck_core::{CheckFileConfig, ConfigError, ConfigResult, ContentCheck, FileConfig, PollConfig};
use failcheck_standby::RunPlan;

use crate::Cli;

const DEFAULT_CONTENT: &str = "Maintenance";
const DEFAULT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_POLL_SECS: u64 = 10;

pub fn build_plan(cli: &Cli, file: &FileConfig, group: &str) -> ConfigResult<RunPlan> {
    let check = file.check.clone().unwrap_or_default();

    let poll = PollConfig::from_secs(
        cli.poll.or(check.poll_secs).unwrap_or(DEFAULT_POLL_SECS),
        cli.timeout.or(check.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS),
    )?;

    let url = cli
        .url
        .clone()
        .or(check.url.clone())
        .ok_or(ConfigError::Missing(vec!["url"]))?;
    let content = cli
        .content
        .clone()
        .or(check.content.clone())
        .unwrap_or_else(|| DEFAULT_CONTENT.to_string());

    let failover = with_transport(cli, ContentCheck::new(url, content));
    let plan = RunPlan::new(group, poll, failover).with_max_restore_rounds(cli.max_restore_rounds);

    match primary_check(cli, &check)? {
        Some(primary) => Ok(plan.with_primary(primary)),
        None => Ok(plan),
    }
}

fn primary_check(cli: &Cli, check: &CheckFileConfig) -> ConfigResult<Option<ContentCheck>> {
    let url = cli.primary_url.clone().or(check.primary_url.clone());
    let content = cli.primary_content.clone().or(check.primary_content.clone());

    match (url, content) {
        (Some(url), Some(content)) => Ok(Some(with_transport(cli, ContentCheck::new(url, content)))),
        (Some(_), None) => Err(ConfigError::Invalid(
            "--primary-url needs --primary-content".to_string(),
        )),
        (None, Some(_)) => Err(ConfigError::Invalid(
            "--primary-content needs --primary-url".to_string(),
        )),
        (None, None) => Ok(None),
    }
}

fn with_transport(cli: &Cli, check: ContentCheck) -> ContentCheck {
    check
        .with_basic_auth(cli.user.clone(), cli.pwd.clone())
        .with_skip_tls_verify(cli.insecure)
}

/// Process exit status for a cumulative failure count.
///
/// Saturates at 255 so a large count never wraps to success.
pub fn exit_status(total: u32) -> u8 {
    u8::try_from(total).unwrap_or(u8::MAX)
}
