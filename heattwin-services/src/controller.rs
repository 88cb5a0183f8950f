//! Controller service: one control session against the remote plants

use anyhow::{Context, Result};
use heattwin_connectors::{Connect, PlantProxy, RpcClient};
use heattwin_core::{Controller, RunSummary, TwinConfig};
use log::info;

/// Run a full control session over `connect`
///
/// Returns once the session reaches its stop time. Lost plant replies do not
/// end the run early; they show up in the summary.
pub fn run_controller<C: Connect>(config: &TwinConfig, connect: C) -> Result<RunSummary> {
    let mut controller = Controller::new(&config.controller).context("controller configuration")?;
    let mut plant = PlantProxy::new(RpcClient::new(connect, config.rpc.timeout()));

    info!(
        "starting {} control run: {} s in {} s steps",
        controller.policy(),
        config.controller.stop_time,
        config.controller.delta_t
    );
    let summary = controller.run(&mut plant);

    let stats = plant.rpc().stats();
    info!(
        "run finished after {} steps: RMSE {:.3}, {} recalibrations, {} missing replies ({} of {} calls timed out)",
        summary.steps,
        summary.published_rmse,
        summary.recalibrations,
        summary.missing_replies,
        stats.timeouts,
        stats.calls
    );
    Ok(summary)
}
