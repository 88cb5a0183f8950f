//! HeatTwin services
//!
//! The long-running processes of the testbed, each a thin loop around the
//! core crate:
//!
//! - [`controller`]: runs one control session against the plants
//! - [`diagnosis`]: answers monitor alerts with minimal diagnoses
//! - [`topology`]: extracts the dependency graph from a twin description
//!
//! The message-driven services share [`service::ServiceLoop`]: one pub/sub
//! session, one inbound topic, and at most one reply per inbound message.
//! Messages are handled strictly one at a time.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
pub mod diagnosis;
pub mod service;
pub mod topology;

use std::path::Path;

use anyhow::{Context, Result};
use heattwin_core::{PolicyKind, TwinConfig};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub use controller::run_controller;
pub use diagnosis::DiagnosisService;
pub use service::{Handler, ServiceLoop};
pub use topology::TopologyService;

/// Install the global logger
///
/// Library crates log through `log`; the subscriber picks those records up.
/// The filter defaults to `info` and follows `RUST_LOG` when set.
pub fn init_logging() {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Load the configuration, apply environment and command-line overrides, and validate
///
/// Without a file the built-in defaults are used.
pub fn load_config(path: Option<&Path>, policy: Option<&str>) -> Result<TwinConfig> {
    let mut config = match path {
        Some(path) => TwinConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => TwinConfig::default(),
    };
    config.broker.apply_env().context("broker environment overrides")?;
    if let Some(name) = policy {
        config.controller.policy = name.parse::<PolicyKind>()?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_policy_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"controller": {{"policy": "reactive"}}}}"#).unwrap();

        let config = load_config(Some(file.path()), Some("advanced")).unwrap();
        assert_eq!(config.controller.policy, PolicyKind::Predictive);
    }

    #[test]
    fn unknown_cli_policy_is_fatal() {
        let err = load_config(None, Some("pid")).unwrap_err();
        assert!(err.to_string().contains("pid"));
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.controller.policy, PolicyKind::default());
    }
}
