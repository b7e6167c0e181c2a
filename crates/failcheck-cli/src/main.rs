use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use failcheck_core::{FileConfig, FleetSettings};
use failcheck_fleet::AwsFleet;
use failcheck_probe::HttpProbe;
use failcheck_standby::Orchestrator;

mod logging;
mod settings;

#[derive(Parser, Debug)]
#[command(
    name = "failcheck",
    about = "Verify that a fleet fails over to its maintenance endpoint and comes back",
    version
)]
pub struct Cli {
    /// The failover url to check while instances are in standby
    #[arg(long)]
    url: Option<String>,
    /// The content to check for at the failover url [default: Maintenance]
    #[arg(long)]
    content: Option<String>,
    /// The timeout for each poll, in seconds [default: 600]
    #[arg(long)]
    timeout: Option<u64>,
    /// The poll interval, in seconds [default: 10]
    #[arg(long)]
    poll: Option<u64>,
    /// A user for basic authentication
    #[arg(long)]
    user: Option<String>,
    /// The password for the basic auth user
    #[arg(long)]
    pwd: Option<String>,
    /// Whether to ignore certificate TLS errors
    #[arg(long)]
    insecure: bool,
    /// The url that should serve the application again once restored
    #[arg(long)]
    primary_url: Option<String>,
    /// The content expected at the primary url
    #[arg(long)]
    primary_content: Option<String>,
    /// Auto scaling group name (overrides ASG_NAME and the config file)
    #[arg(long)]
    group: Option<String>,
    /// Path to a failcheck.toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Give up restoring instances after this many rounds (default: never)
    #[arg(long)]
    max_restore_rounds: Option<u32>,
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_format) {
        eprintln!("failcheck: failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(total) => ExitCode::from(settings::exit_status(total)),
        Err(e) => {
            error!("failcheck aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u32> {
    let file = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    let fleet_settings = FleetSettings::from_env(file.fleet.as_ref(), cli.group.as_deref());
    fleet_settings
        .validate()
        .context("fleet credentials needed")?;

    let plan = settings::build_plan(&cli, &file, fleet_settings.group()?)?;
    info!(group = %plan.group, url = plan.failover.url(), "starting failover check");

    let fleet = Arc::new(AwsFleet::from_settings(&fleet_settings)?);
    let probe = Arc::new(HttpProbe::new()?);

    let report = Orchestrator::new(fleet, probe, plan).run().await?;
    Ok(report.total())
}
