//! Heater decision rules
//!
//! Both policies decide the same way: a zone's heater goes to full power when
//! the average of its two bounding sensors is below target, otherwise off. They
//! differ only in which readings feed that rule (live vs. predicted). The
//! stuck-off fault override is applied by the reactive policy only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::model::{HeaterCommand, Readings, Zone};

/// Control strategy, fixed for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Decide from the latest real readings
    #[serde(alias = "simple")]
    Reactive,
    /// Decide from a model look-ahead and keep the model calibrated
    #[serde(alias = "advanced")]
    Predictive,
}

impl PolicyKind {
    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Reactive => "reactive",
            PolicyKind::Predictive => "predictive",
        }
    }
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Predictive
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "reactive" | "simple" => Ok(PolicyKind::Reactive),
            "predictive" | "advanced" => Ok(PolicyKind::Predictive),
            _ => Err(ConfigError::UnknownPolicy { name: name.to_string() }),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zones whose heater fails stuck-off at a known simulated time
///
/// Keyed by zone name, valued by the elapsed time (s) from which the heater
/// delivers nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultSchedule(BTreeMap<String, f64>);

impl FaultSchedule {
    /// Empty schedule: no heater ever fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `zone` to fail at `at` seconds
    pub fn with_fault(mut self, zone: Zone, at: f64) -> Self {
        self.0.insert(zone.as_str().to_string(), at);
        self
    }

    /// Scheduled failure time of a zone
    pub fn fault_time(&self, zone: Zone) -> Option<f64> {
        self.0.get(zone.as_str()).copied()
    }

    /// Whether the zone's heater has failed by `elapsed`
    pub fn has_failed(&self, zone: Zone, elapsed: f64) -> bool {
        self.fault_time(zone).map_or(false, |at| elapsed >= at)
    }

    /// Zone names in the schedule
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Force failed heaters to zero
    pub fn apply(&self, command: &mut HeaterCommand, elapsed: f64) {
        for zone in Zone::ALL {
            if self.has_failed(zone, elapsed) {
                command.set(zone, 0.0);
            }
        }
    }
}

/// Heater command derived from a set of readings
///
/// Zones whose bounding sensors are missing from `readings` (e.g. a timed-out
/// look-ahead) keep their `previous` command.
pub fn decide_heaters(readings: &Readings, target: f64, max_power: f64, previous: &HeaterCommand) -> HeaterCommand {
    let mut command = previous.clone();
    for zone in Zone::ALL {
        let (first, second) = zone.bounding_sensors();
        if let (Some(a), Some(b)) = (readings.sensor(first), readings.sensor(second)) {
            let average = (a + b) / 2.0;
            command.set(zone, if average < target { max_power } else { 0.0 });
        }
    }
    command
}
