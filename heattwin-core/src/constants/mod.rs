//! Constants for HeatTwin
//!
//! Numeric defaults and topic names used throughout the testbed. The values
//! describe the reference deployment: a three-zone building with 10 kW heaters,
//! a 200 s control step and a 5000 s run.
//!
//! ## Organization
//!
//! - **Plant**: thermal parameters of the reference building
//! - **Control**: control-loop timing and heater limits
//! - **Divergence**: RMSE thresholds and recalibration search settings
//! - **Diagnosis**: component naming conventions
//! - **Topics**: pub/sub topic names

/// Thermal parameters of the reference building.
pub mod plant;

/// Control-loop timing, targets and heater limits.
pub mod control;

/// Divergence thresholds and recalibration search settings.
pub mod divergence;

/// Component naming used by the diagnosis engine.
pub mod diagnosis;

/// Pub/sub topic names.
pub mod topics;

// Re-export commonly used constants for convenience
pub use control::{DEFAULT_DELTA_T_S, DEFAULT_STOP_TIME_S, DEFAULT_TARGET_TEMP_C, MAX_HEATER_POWER_W};
pub use divergence::{
    CONVERGENCE_RMSE, OUTLIER_RMSE, RECALIBRATION_TRIGGER_RMSE,
    INITIAL_LEARNING_RATE, LEARNING_RATE_DECAY, MAX_RECALIBRATION_SWEEPS,
};
pub use plant::{DEFAULT_ENVIRONMENT_TEMP_C, DEFAULT_HEAT_CAPACITY_J_PER_K};
