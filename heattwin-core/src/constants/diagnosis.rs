//! Diagnosis Naming Conventions

/// Suffix marking a sensor reading one control step ahead.
///
/// The monitor reports `TA` when the *next* reading of TA misbehaves, so the
/// graph node for that observation is `TA+1`.
pub const LOOKAHEAD_SUFFIX: &str = "+1";

/// Name prefix of temperature sensor components.
pub const SENSOR_PREFIX: char = 'T';

/// Name prefix of heater components.
pub const HEATER_PREFIX: char = 'H';

/// Name prefix of heater controller components.
pub const CONTROLLER_PREFIX: char = 'C';
