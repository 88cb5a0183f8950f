//! Zones, sensors and the parameter sets describing the building
//!
//! ## Layout
//!
//! ```text
//!   TA        TB        TC        TD
//!   │  ┌────┐ │  ┌────┐ │  ┌────┐ │
//!   └──┤ Z1 ├─┴──┤ Z2 ├─┴──┤ Z3 ├─┘
//!      └────┘    └────┘    └────┘
//!        H1        H2        H3
//! ```
//!
//! Each zone is bounded by two sensors. TA and TD read the end zones, TB and TC
//! the average of the two zones they sit between.
//!
//! Wire payloads key everything by name (`"Z1"`, `"TA"`), so the maps here are
//! keyed by `String` and the [`Zone`] / [`Sensor`] enums provide typed access.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::plant::{
    DEFAULT_HEAT_CAPACITY_J_PER_K, HEAT_TRANSFER_BETWEEN_ZONES_W_PER_K,
    HEAT_TRANSFER_EXTERNAL_Z1_W_PER_K, HEAT_TRANSFER_EXTERNAL_Z2_W_PER_K,
    HEAT_TRANSFER_EXTERNAL_Z3_W_PER_K, INITIAL_SENSOR_VALUE, INITIAL_ZONE_TEMP_C,
};

/// Key under which the plant reports the outside temperature
pub const ENVIRONMENT_KEY: &str = "environment";

/// A thermally coupled region with its own heater
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    /// West end zone
    Z1,
    /// Middle zone
    Z2,
    /// East end zone
    Z3,
}

impl Zone {
    /// All zones in wire order
    pub const ALL: [Zone; 3] = [Zone::Z1, Zone::Z2, Zone::Z3];

    /// Wire name of the zone
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Z1 => "Z1",
            Zone::Z2 => "Z2",
            Zone::Z3 => "Z3",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Zone> {
        Zone::ALL.into_iter().find(|zone| zone.as_str() == name)
    }

    /// The two sensors bounding this zone
    pub fn bounding_sensors(self) -> (Sensor, Sensor) {
        match self {
            Zone::Z1 => (Sensor::TA, Sensor::TB),
            Zone::Z2 => (Sensor::TB, Sensor::TC),
            Zone::Z3 => (Sensor::TC, Sensor::TD),
        }
    }

    /// Zones sharing a wall with this one
    pub fn neighbours(self) -> &'static [Zone] {
        match self {
            Zone::Z1 => &[Zone::Z2],
            Zone::Z2 => &[Zone::Z1, Zone::Z3],
            Zone::Z3 => &[Zone::Z2],
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point temperature sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sensor {
    /// Outer wall of Z1
    TA,
    /// Between Z1 and Z2
    TB,
    /// Between Z2 and Z3
    TC,
    /// Outer wall of Z3
    TD,
}

impl Sensor {
    /// The four sensor channels, in the order used for RMSE
    pub const ALL: [Sensor; 4] = [Sensor::TA, Sensor::TB, Sensor::TC, Sensor::TD];

    /// Wire name of the sensor
    pub fn as_str(self) -> &'static str {
        match self {
            Sensor::TA => "TA",
            Sensor::TB => "TB",
            Sensor::TC => "TC",
            Sensor::TD => "TD",
        }
    }

    /// Field name under which the latest prediction for this sensor is
    /// forwarded to the real plant
    pub fn simulated_field(self) -> &'static str {
        match self {
            Sensor::TA => "Simulated Temperature Sensor A",
            Sensor::TB => "Simulated Temperature Sensor B",
            Sensor::TC => "Simulated Temperature Sensor C",
            Sensor::TD => "Simulated Temperature Sensor D",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of temperature values keyed by zone or sensor name
///
/// Used both for the controller's current view of the plant and for the
/// snapshots returned by plant queries. A timed-out query yields an empty set;
/// consumers treat missing sensors as zero when scoring and keep their previous
/// value when updating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Readings(BTreeMap<String, f64>);

impl Readings {
    /// Empty set of readings
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Controller state before the first plant reply: zones at 15 °C, sensors at 0
    pub fn initial() -> Self {
        let mut readings = Self::new();
        for zone in Zone::ALL {
            readings.insert(zone.as_str(), INITIAL_ZONE_TEMP_C);
        }
        for sensor in Sensor::ALL {
            readings.insert(sensor.as_str(), INITIAL_SENSOR_VALUE);
        }
        readings
    }

    /// All four sensors at zero; seeds the prediction history
    pub fn zero_sensors() -> Self {
        Sensor::ALL.into_iter().map(|s| (s.as_str().to_string(), 0.0)).collect()
    }

    /// Extract the numeric fields of a plant reply
    ///
    /// Non-numeric fields (e.g. a `null` `delta_t`) are skipped. Anything that
    /// is not a JSON object yields an empty set.
    pub fn from_reply(reply: &Value) -> Self {
        match reply.as_object() {
            Some(fields) => fields
                .iter()
                .filter_map(|(key, value)| value.as_f64().map(|v| (key.clone(), v)))
                .collect(),
            None => Self::new(),
        }
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Value of a sensor channel
    pub fn sensor(&self, sensor: Sensor) -> Option<f64> {
        self.get(sensor.as_str())
    }

    /// Value of a sensor channel, zero when missing
    pub fn sensor_or_zero(&self, sensor: Sensor) -> f64 {
        self.sensor(sensor).unwrap_or(0.0)
    }

    /// Temperature of a zone
    pub fn zone(&self, zone: Zone) -> Option<f64> {
        self.get(zone.as_str())
    }

    /// Outside temperature, if the reply carried one
    pub fn environment(&self) -> Option<f64> {
        self.get(ENVIRONMENT_KEY)
    }

    /// Store a value
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    /// Overwrite the keys this set already tracks with the values in `update`
    ///
    /// Keys absent from `self` are ignored, as are keys missing from `update`.
    /// Returns the keys that were written.
    pub fn merge_known(&mut self, update: &Readings) -> Vec<String> {
        let mut written = Vec::new();
        for (key, value) in &update.0 {
            if let Some(slot) = self.0.get_mut(key) {
                *slot = *value;
                written.push(key.clone());
            }
        }
        written
    }

    /// Iterate over `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is stored (e.g. the query timed out)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Readings {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Commanded heater power per zone, in watts
///
/// The policy only ever commands `0` or the configured maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaterCommand(BTreeMap<String, f64>);

impl HeaterCommand {
    /// All heaters off
    pub fn off() -> Self {
        Self(Zone::ALL.into_iter().map(|z| (z.as_str().to_string(), 0.0)).collect())
    }

    /// Commanded power for a zone (0 if unset)
    pub fn power(&self, zone: Zone) -> f64 {
        self.0.get(zone.as_str()).copied().unwrap_or(0.0)
    }

    /// Set the commanded power for a zone
    pub fn set(&mut self, zone: Zone, power: f64) {
        self.0.insert(zone.as_str().to_string(), power);
    }

    /// True when the zone's heater is commanded on
    pub fn is_on(&self, zone: Zone) -> bool {
        self.power(zone) > 0.0
    }
}

impl Default for HeaterCommand {
    fn default() -> Self {
        Self::off()
    }
}

/// One scalar of a [`ThermalParameters`] set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterRef {
    /// Heat capacity of a zone
    Capacity(String),
    /// External heat-transfer coefficient of a zone
    External(String),
    /// Heat-transfer coefficient from a zone to one neighbour
    Coupling(String, String),
}

impl fmt::Display for ParameterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterRef::Capacity(zone) => write!(f, "capacity[{}]", zone),
            ParameterRef::External(zone) => write!(f, "heat_transfer_external[{}]", zone),
            ParameterRef::Coupling(zone, nbr) => write!(f, "heat_transfer_zones[{}][{}]", zone, nbr),
        }
    }
}

/// Physical parameters of the building, as sent to a plant simulator
///
/// Two instances exist per deployment: the real set (ground truth, drifting)
/// and the model set (the controller's estimate, recalibrated). All values are
/// kept non-negative; [`ThermalParameters::set`] clamps at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalParameters {
    /// Heat capacity per zone (J/K)
    pub capacity: BTreeMap<String, f64>,
    /// External heat-transfer coefficient per zone (W/K)
    pub heat_transfer_external: BTreeMap<String, f64>,
    /// Zone → neighbour → heat-transfer coefficient (W/K)
    pub heat_transfer_zones: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for ThermalParameters {
    fn default() -> Self {
        let capacity = Zone::ALL
            .into_iter()
            .map(|z| (z.as_str().to_string(), DEFAULT_HEAT_CAPACITY_J_PER_K))
            .collect();

        let heat_transfer_external = [
            (Zone::Z1, HEAT_TRANSFER_EXTERNAL_Z1_W_PER_K),
            (Zone::Z2, HEAT_TRANSFER_EXTERNAL_Z2_W_PER_K),
            (Zone::Z3, HEAT_TRANSFER_EXTERNAL_Z3_W_PER_K),
        ]
        .into_iter()
        .map(|(z, k)| (z.as_str().to_string(), k))
        .collect();

        let heat_transfer_zones = Zone::ALL
            .into_iter()
            .map(|zone| {
                let couplings = zone
                    .neighbours()
                    .iter()
                    .map(|nbr| (nbr.as_str().to_string(), HEAT_TRANSFER_BETWEEN_ZONES_W_PER_K))
                    .collect();
                (zone.as_str().to_string(), couplings)
            })
            .collect();

        Self {
            capacity,
            heat_transfer_external,
            heat_transfer_zones,
        }
    }
}

impl ThermalParameters {
    /// Every scalar parameter, in search order: capacities, external
    /// coefficients, then zone couplings
    pub fn parameters(&self) -> Vec<ParameterRef> {
        let mut params: Vec<ParameterRef> = self
            .capacity
            .keys()
            .map(|z| ParameterRef::Capacity(z.clone()))
            .collect();
        params.extend(self.heat_transfer_external.keys().map(|z| ParameterRef::External(z.clone())));
        for (zone, couplings) in &self.heat_transfer_zones {
            params.extend(couplings.keys().map(|n| ParameterRef::Coupling(zone.clone(), n.clone())));
        }
        params
    }

    /// Current value of a parameter
    pub fn get(&self, param: &ParameterRef) -> Option<f64> {
        match param {
            ParameterRef::Capacity(zone) => self.capacity.get(zone).copied(),
            ParameterRef::External(zone) => self.heat_transfer_external.get(zone).copied(),
            ParameterRef::Coupling(zone, nbr) => {
                self.heat_transfer_zones.get(zone).and_then(|c| c.get(nbr)).copied()
            }
        }
    }

    /// Set a parameter, clamping negative values to zero
    pub fn set(&mut self, param: &ParameterRef, value: f64) {
        let value = value.max(0.0);
        match param {
            ParameterRef::Capacity(zone) => {
                self.capacity.insert(zone.clone(), value);
            }
            ParameterRef::External(zone) => {
                self.heat_transfer_external.insert(zone.clone(), value);
            }
            ParameterRef::Coupling(zone, nbr) => {
                self.heat_transfer_zones
                    .entry(zone.clone())
                    .or_default()
                    .insert(nbr.clone(), value);
            }
        }
    }

    /// Check the non-negativity invariant
    pub fn is_non_negative(&self) -> bool {
        self.parameters()
            .iter()
            .all(|p| self.get(p).map_or(true, |v| v >= 0.0))
    }

    /// Multiply every external coefficient by the factor `factor(zone)` returns
    pub fn scale_external<F>(&mut self, mut factor: F)
    where
        F: FnMut(&str) -> f64,
    {
        for (zone, value) in self.heat_transfer_external.iter_mut() {
            *value = (*value * factor(zone)).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zones_are_bounded_by_adjacent_sensors() {
        assert_eq!(Zone::Z1.bounding_sensors(), (Sensor::TA, Sensor::TB));
        assert_eq!(Zone::Z2.bounding_sensors(), (Sensor::TB, Sensor::TC));
        assert_eq!(Zone::Z3.bounding_sensors(), (Sensor::TC, Sensor::TD));
    }

    #[test]
    fn initial_readings() {
        let readings = Readings::initial();
        assert_eq!(readings.len(), 7);
        assert_eq!(readings.zone(Zone::Z2), Some(15.0));
        assert_eq!(readings.sensor(Sensor::TC), Some(0.0));
        assert_eq!(readings.environment(), None);
    }

    #[test]
    fn reply_parsing_skips_non_numeric_fields() {
        let reply = json!({"TA": 16.5, "Z1": 16.5, "environment": 15, "delta_t": null});
        let readings = Readings::from_reply(&reply);

        assert_eq!(readings.sensor(Sensor::TA), Some(16.5));
        assert_eq!(readings.environment(), Some(15.0));
        assert_eq!(readings.get("delta_t"), None);

        assert!(Readings::from_reply(&Value::Null).is_empty());
    }

    #[test]
    fn merge_only_touches_known_keys() {
        let mut current = Readings::initial();
        let update: Readings = [("TA", 17.0), ("environment", 14.0)].into_iter().collect();

        let written = current.merge_known(&update);

        assert_eq!(written, vec!["TA".to_string()]);
        assert_eq!(current.sensor(Sensor::TA), Some(17.0));
        assert_eq!(current.environment(), None);
    }

    #[test]
    fn default_parameters_match_reference_building() {
        let params = ThermalParameters::default();
        assert_eq!(params.get(&ParameterRef::External("Z3".into())), Some(1042.0));
        assert_eq!(params.get(&ParameterRef::Coupling("Z2".into(), "Z1".into())), Some(500.0));
        assert_eq!(params.get(&ParameterRef::Coupling("Z1".into(), "Z3".into())), None);
        // 3 capacities + 3 external + 4 couplings
        assert_eq!(params.parameters().len(), 10);
    }

    #[test]
    fn set_clamps_at_zero() {
        let mut params = ThermalParameters::default();
        let param = ParameterRef::External("Z2".into());
        params.set(&param, -120.0);
        assert_eq!(params.get(&param), Some(0.0));
        assert!(params.is_non_negative());
    }

    #[test]
    fn parameters_serialize_with_wire_field_names() {
        let value = serde_json::to_value(ThermalParameters::default()).unwrap();
        assert_eq!(value["heat_transfer_external"]["Z1"], json!(1000.0));
        assert_eq!(value["heat_transfer_zones"]["Z2"]["Z3"], json!(500.0));
    }

    #[test]
    fn heater_command_defaults_off() {
        let mut command = HeaterCommand::off();
        assert!(!command.is_on(Zone::Z1));
        command.set(Zone::Z1, 10_000.0);
        assert!(command.is_on(Zone::Z1));
        assert_eq!(serde_json::to_value(&command).unwrap()["Z1"], json!(10_000.0));
    }
}
