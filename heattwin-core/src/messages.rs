//! Wire payloads exchanged over pub/sub
//!
//! All payloads are JSON objects. Field names follow the deployed services
//! exactly, including the spaced `Simulated Temperature Sensor *` keys and the
//! upper-case `RMSE`.
//!
//! | Type | Topic |
//! |------|-------|
//! | [`PlantCommand`] | `controller/heater_simulation` |
//! | [`RealPlantCommand`] | `controller/heater_status` |
//! | [`AlertMessage`] | `monitor/alert` |
//! | [`DiagnosisOutput`] | `diagnosis/output` |
//!
//! Plant replies are not modelled as structs; they are read leniently through
//! [`Readings::from_reply`](crate::model::Readings::from_reply).

use serde::{Deserialize, Serialize};

use crate::diagnosis::Diagnosis;
use crate::model::{HeaterCommand, Readings, Sensor, ThermalParameters};

/// Request for one simulated step of a plant
///
/// Sent as-is to the predictive plant. The real plant receives the same fields
/// wrapped in a [`RealPlantCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantCommand {
    /// Commanded power per zone
    pub heater_status: HeaterCommand,
    /// Last known zone and sensor temperatures
    pub current_temperatures: Readings,
    /// Step length (s)
    pub delta_t: f64,
    /// Parameter set the simulator should use
    #[serde(flatten)]
    pub parameters: ThermalParameters,
}

impl PlantCommand {
    /// Assemble a command from borrowed controller state
    pub fn new(
        heater_status: &HeaterCommand,
        current_temperatures: &Readings,
        delta_t: f64,
        parameters: &ThermalParameters,
    ) -> Self {
        Self {
            heater_status: heater_status.clone(),
            current_temperatures: current_temperatures.clone(),
            delta_t,
            parameters: parameters.clone(),
        }
    }
}

/// Request for one step of the real plant
///
/// Carries the published RMSE and the latest prediction so the plant side can
/// log and plot them; neither influences the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealPlantCommand {
    /// Heater command, readings, step and real parameters
    #[serde(flatten)]
    pub command: PlantCommand,
    /// Last published (non-outlier) RMSE
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    /// Latest prediction for TA
    #[serde(rename = "Simulated Temperature Sensor A")]
    pub simulated_a: f64,
    /// Latest prediction for TB
    #[serde(rename = "Simulated Temperature Sensor B")]
    pub simulated_b: f64,
    /// Latest prediction for TC
    #[serde(rename = "Simulated Temperature Sensor C")]
    pub simulated_c: f64,
    /// Latest prediction for TD
    #[serde(rename = "Simulated Temperature Sensor D")]
    pub simulated_d: f64,
    /// Last known outside temperature
    pub environment: f64,
}

impl RealPlantCommand {
    /// Wrap a plant command with the telemetry forwarded to the real plant
    pub fn new(command: PlantCommand, rmse: f64, last_prediction: &Readings, environment: f64) -> Self {
        Self {
            command,
            rmse,
            simulated_a: last_prediction.sensor_or_zero(Sensor::TA),
            simulated_b: last_prediction.sensor_or_zero(Sensor::TB),
            simulated_c: last_prediction.sensor_or_zero(Sensor::TC),
            simulated_d: last_prediction.sensor_or_zero(Sensor::TD),
            environment,
        }
    }
}

/// Anomaly report from the monitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Whether the monitor raised an alert
    #[serde(default)]
    pub alert: bool,
    /// Sensors whose recent history looks wrong (`TA`..`TD`)
    #[serde(default)]
    pub problematic_sensors: Vec<String>,
}

/// Minimal diagnoses published for an alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisOutput {
    /// One list of component names per minimal diagnosis
    pub diagnosis_results: Vec<Vec<String>>,
}

impl DiagnosisOutput {
    /// Render diagnoses as sorted name lists
    pub fn from_diagnoses(diagnoses: &[Diagnosis]) -> Self {
        Self {
            diagnosis_results: diagnoses
                .iter()
                .map(|d| d.iter().cloned().collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn real_command_flattens_to_wire_fields() {
        let command = PlantCommand::new(
            &HeaterCommand::off(),
            &Readings::initial(),
            200.0,
            &ThermalParameters::default(),
        );
        let prediction: Readings = [("TA", 1.0), ("TB", 2.0), ("TC", 3.0), ("TD", 4.0)]
            .into_iter()
            .collect();
        let real = RealPlantCommand::new(command, 0.3, &prediction, 15.0);

        let value = serde_json::to_value(&real).unwrap();
        assert_eq!(value["delta_t"], json!(200.0));
        assert_eq!(value["RMSE"], json!(0.3));
        assert_eq!(value["Simulated Temperature Sensor C"], json!(3.0));
        assert_eq!(value["capacity"]["Z1"], json!(1.0e6));
        assert_eq!(value["heater_status"]["Z2"], json!(0.0));
        assert!(value.get("parameters").is_none());
    }

    #[test]
    fn plant_command_reads_either_request() {
        let command = PlantCommand::new(
            &HeaterCommand::off(),
            &Readings::initial(),
            200.0,
            &ThermalParameters::default(),
        );
        let real = RealPlantCommand::new(command.clone(), 0.0, &Readings::zero_sensors(), 15.0);

        let bytes = serde_json::to_vec(&real).unwrap();
        let parsed: PlantCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, command);
    }

    #[test]
    fn alert_fields_default() {
        let alert: AlertMessage = serde_json::from_value(json!({"alert": true})).unwrap();
        assert!(alert.alert);
        assert!(alert.problematic_sensors.is_empty());
    }
}
