//! Deployment configuration
//!
//! Every field has a default matching the reference deployment, so an empty
//! JSON object (or no file at all) is a valid configuration. Files are JSON:
//!
//! ```json
//! {
//!   "broker": { "host": "broker.local" },
//!   "controller": {
//!     "policy": "reactive",
//!     "fault_schedule": { "Z1": 1500 }
//!   }
//! }
//! ```
//!
//! Broker settings can additionally be overridden from the environment
//! (`MQTT_SERVER_URL`, `MQTT_SERVER_PORT`, `MQTT_SERVER_USER`,
//! `MQTT_SERVER_PASS`). Validation runs after loading; anything invalid is
//! fatal, including an unknown policy name.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::control::{
    DEFAULT_DELTA_T_S, DEFAULT_RPC_TIMEOUT_S, DEFAULT_STOP_TIME_S, DEFAULT_TARGET_TEMP_C,
    MAX_HEATER_POWER_W,
};
use crate::constants::plant::{DEFAULT_DRIFT_SPAN, DEFAULT_ENVIRONMENT_TEMP_C};
use crate::constants::topics;
use crate::control::{FaultSchedule, PolicyKind};
use crate::divergence::DivergenceThresholds;
use crate::errors::{ConfigError, ConfigResult};
use crate::model::{ThermalParameters, Zone};
use crate::recalibrate::RecalibrationSettings;

/// MQTT broker connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host name
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Optional user name
    pub username: Option<String>,
    /// Optional password
    pub password: Option<String>,
    /// MQTT keep-alive (s)
    pub keep_alive_secs: u64,
    /// Prefix for generated client ids
    pub client_id_prefix: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            keep_alive_secs: 60,
            client_id_prefix: "heattwin".to_string(),
        }
    }
}

impl BrokerConfig {
    /// Apply `MQTT_SERVER_*` overrides from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = read("MQTT_SERVER_URL") {
            self.host = host;
        }
        if let Some(port) = read("MQTT_SERVER_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "broker.port".to_string(),
                reason: "MQTT_SERVER_PORT is not a port number",
            })?;
        }
        if let Some(user) = read("MQTT_SERVER_USER") {
            self.username = Some(user);
        }
        if let Some(pass) = read("MQTT_SERVER_PASS") {
            self.password = Some(pass);
        }
        Ok(())
    }
}

/// Request/reply settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// How long a call waits for its reply (s)
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_RPC_TIMEOUT_S,
        }
    }
}

impl RpcConfig {
    /// Reply timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Control loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Control strategy
    pub policy: PolicyKind,
    /// Target temperature (°C)
    pub target_temperature: f64,
    /// Simulated time at which the run stops (s)
    pub stop_time: f64,
    /// Simulated time per step (s)
    pub delta_t: f64,
    /// Power of a heater switched on (W)
    pub max_heater_power: f64,
    /// Stuck-off heater failures (zone → s)
    pub fault_schedule: FaultSchedule,
    /// Outside temperature before the first plant reply (°C)
    pub environment_temperature: f64,
    /// Drift span of the real external coefficients; 0 disables drift
    pub drift_span: f64,
    /// Seed for the drift generator; random when absent
    pub seed: Option<u64>,
    /// Ground-truth parameters
    pub real: ThermalParameters,
    /// Initial model parameters
    pub model: ThermalParameters,
    /// RMSE thresholds
    pub divergence: DivergenceThresholds,
    /// Recalibration search settings
    pub recalibration: RecalibrationSettings,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            target_temperature: DEFAULT_TARGET_TEMP_C,
            stop_time: DEFAULT_STOP_TIME_S,
            delta_t: DEFAULT_DELTA_T_S,
            max_heater_power: MAX_HEATER_POWER_W,
            fault_schedule: FaultSchedule::default(),
            environment_temperature: DEFAULT_ENVIRONMENT_TEMP_C,
            drift_span: DEFAULT_DRIFT_SPAN,
            seed: None,
            real: ThermalParameters::default(),
            model: ThermalParameters::default(),
            divergence: DivergenceThresholds::default(),
            recalibration: RecalibrationSettings::default(),
        }
    }
}

impl ControllerConfig {
    /// Check ranges and names
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, reason: &'static str| ConfigError::Invalid {
            field: format!("controller.{}", field),
            reason,
        };

        if !(self.delta_t > 0.0) {
            return Err(invalid("delta_t", "must be positive"));
        }
        if !(self.stop_time >= 0.0) {
            return Err(invalid("stop_time", "must not be negative"));
        }
        if !(self.max_heater_power >= 0.0) {
            return Err(invalid("max_heater_power", "must not be negative"));
        }
        if !(self.drift_span >= 0.0) {
            return Err(invalid("drift_span", "must not be negative"));
        }
        if let Some(zone) = self.fault_schedule.zones().find(|z| Zone::parse(z).is_none()) {
            return Err(ConfigError::Invalid {
                field: format!("controller.fault_schedule.{}", zone),
                reason: "not a zone name",
            });
        }
        if !self.real.is_non_negative() {
            return Err(invalid("real", "parameters must not be negative"));
        }
        if !self.model.is_non_negative() {
            return Err(invalid("model", "parameters must not be negative"));
        }
        if !(self.divergence.convergence > 0.0 && self.divergence.trigger > 0.0) {
            return Err(invalid("divergence", "thresholds must be positive"));
        }
        if !(self.recalibration.initial_learning_rate > 0.0) {
            return Err(invalid("recalibration.initial_learning_rate", "must be positive"));
        }
        if !(self.recalibration.decay > 0.0 && self.recalibration.decay <= 1.0) {
            return Err(invalid("recalibration.decay", "must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Diagnosis service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Twin description sent to the topology extractor; the built-in
    /// heating-zone topology is used when absent
    pub twin_description: Option<PathBuf>,
    /// Topic the twin description is published on
    pub topology_request_topic: String,
    /// Topic the extractor answers on
    pub topology_reply_topic: String,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            twin_description: None,
            topology_request_topic: topics::TOPOLOGY_REQUEST.to_string(),
            topology_reply_topic: topics::TOPOLOGY_REPLY.to_string(),
        }
    }
}

/// Complete testbed configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    /// Broker connection
    pub broker: BrokerConfig,
    /// Request/reply timeout
    pub rpc: RpcConfig,
    /// Control loop
    pub controller: ControllerConfig,
    /// Diagnosis service
    pub diagnosis: DiagnosisConfig,
}

impl TwinConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: TwinConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        if self.diagnosis.topology_request_topic.is_empty() || self.diagnosis.topology_reply_topic.is_empty() {
            return Err(ConfigError::Invalid {
                field: "diagnosis".to_string(),
                reason: "topology topics must not be empty",
            });
        }
        if self.rpc.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "rpc.timeout_secs".to_string(),
                reason: "must be positive",
            });
        }
        self.controller.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = TwinConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.controller.delta_t, 200.0);
        assert_eq!(config.rpc.timeout(), Duration::from_secs(10));
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.diagnosis.topology_reply_topic, "dtdl2graph/reply");
    }

    #[test]
    fn load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"controller": {{"policy": "simple", "fault_schedule": {{"Z1": 1500}}}}, "broker": {{"host": "broker.local"}}}}"#
        )
        .unwrap();

        let config = TwinConfig::load(file.path()).unwrap();
        assert_eq!(config.controller.policy, PolicyKind::Reactive);
        assert_eq!(config.controller.fault_schedule.fault_time(Zone::Z1), Some(1500.0));
        assert_eq!(config.controller.stop_time, 5000.0);
        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 1883);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"controller": {{"policy": "pid"}}}}"#).unwrap();
        assert!(matches!(TwinConfig::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = ControllerConfig::default();
        config.delta_t = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = ControllerConfig::default();
        config.fault_schedule = serde_json::from_str(r#"{"Z9": 10}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            TwinConfig::load("/nonexistent/heattwin.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let mut broker = BrokerConfig::default();
        broker
            .apply_env_from(|name| match name {
                "MQTT_SERVER_URL" => Some("mqtt.example".to_string()),
                "MQTT_SERVER_PORT" => Some("8883".to_string()),
                "MQTT_SERVER_USER" => Some("".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(broker.host, "mqtt.example");
        assert_eq!(broker.port, 8883);
        assert_eq!(broker.username, None);

        let mut broker = BrokerConfig::default();
        let bad = broker.apply_env_from(|name| (name == "MQTT_SERVER_PORT").then(|| "x".to_string()));
        assert!(bad.is_err());
    }
}
