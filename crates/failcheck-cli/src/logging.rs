//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::LogFormat;

const DEFAULT_DIRECTIVE: &str = "failcheck=debug";

/// `RUST_LOG` when set and valid, else `failcheck=debug`.
fn filter_from(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber.
pub fn init(format: LogFormat) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let builder = tracing_subscriber::fmt().with_env_filter(filter_from(rust_log.as_deref()));

    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))
}
