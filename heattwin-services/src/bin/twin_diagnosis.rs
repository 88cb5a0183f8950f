//! twin-diagnosis - explain monitor alerts
//!
//! Usage:
//!   twin-diagnosis                           # built-in heating-zone topology
//!   twin-diagnosis --config twin.json        # twin description from the config

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use heattwin_connectors::{Connect, MqttConnect, RpcClient, TopologyClient};
use heattwin_core::constants::topics;
use heattwin_core::diagnosis::CanonicalTopology;
use heattwin_core::TopologySource;
use heattwin_services::{init_logging, load_config, DiagnosisService, ServiceLoop};
use log::info;

#[derive(Parser)]
#[command(name = "twin-diagnosis")]
#[command(about = "Consistency-based diagnosis of monitor alerts")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Twin description to extract the topology from; overrides the file
    #[arg(long)]
    twin: Option<PathBuf>,
}

fn topology_source(
    connect: &MqttConnect,
    twin: Option<PathBuf>,
    timeout: Duration,
    request_topic: &str,
    reply_topic: &str,
) -> Result<Box<dyn TopologySource>> {
    match twin {
        Some(path) => {
            info!("topology from {} via `{}`", path.display(), request_topic);
            let client = TopologyClient::from_file(RpcClient::new(connect.clone(), timeout), &path)
                .with_context(|| format!("reading {}", path.display()))?
                .with_topics(request_topic, reply_topic);
            Ok(Box::new(client))
        }
        None => {
            info!("using the built-in heating-zone topology");
            Ok(Box::new(CanonicalTopology))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_deref(), None)?;
    info!("heattwin {} diagnosis service", heattwin_core::VERSION);

    let connect = MqttConnect::new(config.broker.clone());
    let twin = cli.twin.or_else(|| config.diagnosis.twin_description.clone());
    let source = topology_source(
        &connect,
        twin,
        config.rpc.timeout(),
        &config.diagnosis.topology_request_topic,
        &config.diagnosis.topology_reply_topic,
    )?;

    let session = connect.connect().context("connecting to the broker")?;
    let mut service = ServiceLoop::start(
        session,
        DiagnosisService::new(source),
        topics::MONITOR_ALERT,
        topics::DIAGNOSIS_OUTPUT,
    )?;
    service.run().context("diagnosis service stopped")?;
    Ok(())
}
