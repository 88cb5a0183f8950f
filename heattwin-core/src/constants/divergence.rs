//! Divergence and Recalibration Constants
//!
//! The trigger and convergence thresholds differ on purpose: recalibration
//! starts above 0.45 and stops below 0.4, which keeps the loop from toggling
//! on every step when the error hovers around a single threshold.

// ===== RMSE THRESHOLDS =====

/// RMSE values at or above this are numerical artifacts and are discarded.
pub const OUTLIER_RMSE: f64 = 10.0;

/// RMSE above which the predictive model is recalibrated.
pub const RECALIBRATION_TRIGGER_RMSE: f64 = 0.45;

/// RMSE below which the recalibration search stops.
pub const CONVERGENCE_RMSE: f64 = 0.4;

// ===== SEARCH SETTINGS =====

/// Step applied to each parameter in the first sweep.
pub const INITIAL_LEARNING_RATE: f64 = 200.0;

/// Factor applied to the learning rate after each sweep.
pub const LEARNING_RATE_DECAY: f64 = 0.75;

/// Maximum number of sweeps per recalibration.
pub const MAX_RECALIBRATION_SWEEPS: usize = 5;
