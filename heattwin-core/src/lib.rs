//! Adaptive control and model-based diagnosis for the HeatTwin testbed
//!
//! A three-zone heated building is simulated by an external plant. This crate
//! holds the parts of the testbed that reason about it:
//!
//! - [`control`]: the heater control loop, in a reactive or a predictive
//!   flavour, which keeps an internal predictive model of the plant
//! - [`divergence`]: scoring of model predictions against reality (RMSE)
//! - [`recalibrate`]: bounded local search that pulls the predictive model back
//!   towards the observed plant
//! - [`diagnosis`]: consistency-based isolation of the components responsible
//!   for an anomaly reported by the monitor
//!
//! Nothing here talks to the network. The plant and the topology extractor are
//! reached through the [`Plant`] and [`TopologySource`] traits; the pub/sub
//! implementations live in `heattwin-connectors`.
//!
//! ```no_run
//! use heattwin_core::{Controller, config::ControllerConfig, Plant};
//!
//! fn drive(plant: &mut impl Plant) -> Result<(), heattwin_core::ConfigError> {
//!     let mut controller = Controller::new(&ControllerConfig::default())?;
//!     let summary = controller.run(plant);
//!     println!("{} steps, final RMSE {:.2}", summary.steps, summary.published_rmse);
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod control;
pub mod diagnosis;
pub mod divergence;
pub mod errors;
pub mod messages;
pub mod model;
pub mod recalibrate;
pub mod traits;

// Public API
pub use config::{BrokerConfig, ControllerConfig, DiagnosisConfig, RpcConfig, TwinConfig};
pub use control::{ControlSession, Controller, PolicyKind, RunSummary, StepReport};
pub use diagnosis::{DiagnosisEngine, DependencyGraph, Diagnosis};
pub use divergence::{rmse, Divergence, DivergenceMonitor};
pub use errors::{ConfigError, DiagnosisError};
pub use model::{HeaterCommand, Readings, Sensor, ThermalParameters, Zone};
pub use recalibrate::{RecalibrationOutcome, Recalibrator};
pub use traits::{Plant, TopologySource};

/// Crate version, reported by the services at startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
