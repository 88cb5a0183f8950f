//! twin-controller - drive the heaters of the HeatTwin building
//!
//! Usage:
//!   twin-controller                          # defaults, predictive policy
//!   twin-controller --config twin.json       # settings from a file
//!   twin-controller --policy reactive        # bang-bang control only

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use heattwin_connectors::MqttConnect;
use heattwin_services::{init_logging, load_config, run_controller};
use log::info;

#[derive(Parser)]
#[command(name = "twin-controller")]
#[command(about = "Heater control loop with a self-recalibrating predictive model")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control policy (reactive|simple, predictive|advanced); overrides the file
    #[arg(long)]
    policy: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_deref(), cli.policy.as_deref())?;
    info!(
        "heattwin {} controller, broker {}:{}",
        heattwin_core::VERSION,
        config.broker.host,
        config.broker.port
    );

    run_controller(&config, MqttConnect::new(config.broker.clone()))?;
    Ok(())
}
