//! twin-topology - extract component dependencies from twin descriptions

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use heattwin_connectors::{Connect, MqttConnect};
use heattwin_services::{init_logging, load_config, ServiceLoop, TopologyService};
use log::info;

#[derive(Parser)]
#[command(name = "twin-topology")]
#[command(about = "Publisher/subscriber dependency extraction for twin descriptions")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_deref(), None)?;
    info!("heattwin {} topology extractor", heattwin_core::VERSION);

    let session = MqttConnect::new(config.broker.clone())
        .connect()
        .context("connecting to the broker")?;
    let mut service = ServiceLoop::start(
        session,
        TopologyService::new(),
        &config.diagnosis.topology_request_topic,
        &config.diagnosis.topology_reply_topic,
    )?;
    service.run().context("topology service stopped")?;
    Ok(())
}
