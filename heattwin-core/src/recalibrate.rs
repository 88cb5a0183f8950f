//! Online recalibration of the predictive model
//!
//! ## Algorithm
//!
//! Bounded coordinate descent over every scalar of the model's
//! [`ThermalParameters`]:
//!
//! ```text
//! η = 200
//! repeat up to 5 sweeps:
//!     r₀ = rmse(target, predict(θ))
//!     if r₀ < 0.4: converged, stop
//!     for each parameter p (in order):
//!         try p - η, p, p + η (clamped at 0), one prediction each
//!         keep the first value scoring strictly below r₀ or below an earlier trial
//!     η = 0.75 · η
//! ```
//!
//! Updates are sequential: parameter *k* is searched with parameters *0..k*
//! already at their new values. A sweep costs at most `1 + 3·P` predictions,
//! which makes this the most network-heavy part of the control loop.
//!
//! Predictions that time out come back empty and score as zeros, so they are
//! rejected as candidates rather than retried.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::divergence::{
    CONVERGENCE_RMSE, INITIAL_LEARNING_RATE, LEARNING_RATE_DECAY, MAX_RECALIBRATION_SWEEPS,
};
use crate::divergence::rmse;
use crate::model::{ParameterRef, Readings, ThermalParameters};

/// Search settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecalibrationSettings {
    /// Parameter step used in the first sweep
    pub initial_learning_rate: f64,
    /// Multiplier applied to the step after each sweep
    pub decay: f64,
    /// Sweep budget
    pub max_sweeps: usize,
    /// RMSE below which the search stops
    pub convergence_threshold: f64,
}

impl Default for RecalibrationSettings {
    fn default() -> Self {
        Self {
            initial_learning_rate: INITIAL_LEARNING_RATE,
            decay: LEARNING_RATE_DECAY,
            max_sweeps: MAX_RECALIBRATION_SWEEPS,
            convergence_threshold: CONVERGENCE_RMSE,
        }
    }
}

/// What happened to one parameter during a sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChoice {
    /// The parameter
    pub parameter: ParameterRef,
    /// Value before the sweep touched it
    pub previous: f64,
    /// Value kept
    pub chosen: f64,
    /// RMSE of the kept value (the sweep's start RMSE if nothing improved)
    pub rmse: f64,
}

/// Record of one sweep
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    /// Step size used
    pub learning_rate: f64,
    /// RMSE measured at the start of the sweep
    pub start_rmse: f64,
    /// RMSE of the parameter set left by the sweep
    pub end_rmse: f64,
    /// Per-parameter decisions, in search order
    pub choices: Vec<ParameterChoice>,
}

/// Result of a recalibration
#[derive(Debug, Clone, PartialEq)]
pub struct RecalibrationOutcome {
    /// Adjusted model; replaces the controller's model set wholesale
    pub parameters: ThermalParameters,
    /// Whether the RMSE dropped below the convergence threshold
    pub converged: bool,
    /// Completed sweeps (a converging check does not start a sweep)
    pub sweeps: Vec<SweepRecord>,
    /// Last RMSE measured for `parameters`
    pub final_rmse: f64,
    /// Number of predictions issued
    pub queries: usize,
}

/// Coordinate-descent recalibrator
#[derive(Debug, Clone, Copy, Default)]
pub struct Recalibrator {
    settings: RecalibrationSettings,
}

impl Recalibrator {
    /// Recalibrator with custom settings
    pub fn new(settings: RecalibrationSettings) -> Self {
        Self { settings }
    }

    /// Current settings
    pub fn settings(&self) -> &RecalibrationSettings {
        &self.settings
    }

    /// Search for parameters whose prediction matches `target`
    ///
    /// `predict` runs the predictive plant with the given parameters (and the
    /// step's heater command and readings, which the caller captures). It is
    /// called synchronously; the search blocks on every call.
    pub fn run<F>(&self, model: &ThermalParameters, target: &Readings, mut predict: F) -> RecalibrationOutcome
    where
        F: FnMut(&ThermalParameters) -> Readings,
    {
        let mut params = model.clone();
        let mut learning_rate = self.settings.initial_learning_rate;
        let mut sweeps = Vec::new();
        let mut queries = 0;
        let mut converged = false;
        let mut final_rmse = f64::INFINITY;

        for sweep in 0..self.settings.max_sweeps {
            let start_rmse = rmse(target, &predict(&params));
            queries += 1;
            final_rmse = start_rmse;
            debug!("recalibration sweep {}: RMSE = {:.2}", sweep, start_rmse);

            if start_rmse < self.settings.convergence_threshold {
                converged = true;
                break;
            }

            let mut state_rmse = start_rmse;
            let mut choices = Vec::new();

            for parameter in params.parameters() {
                let previous = params.get(&parameter).unwrap_or(0.0);
                let mut best = (previous, start_rmse);
                let mut unchanged_rmse = state_rmse;

                for delta in [-learning_rate, 0.0, learning_rate] {
                    let candidate = (previous + delta).max(0.0);
                    params.set(&parameter, candidate);
                    let trial = rmse(target, &predict(&params));
                    queries += 1;

                    if delta == 0.0 {
                        unchanged_rmse = trial;
                    }
                    if trial < best.1 {
                        best = (candidate, trial);
                    }
                }

                params.set(&parameter, best.0);
                state_rmse = if best.0 == previous { unchanged_rmse } else { best.1 };
                choices.push(ParameterChoice {
                    parameter,
                    previous,
                    chosen: best.0,
                    rmse: best.1,
                });
            }

            final_rmse = state_rmse;
            sweeps.push(SweepRecord {
                learning_rate,
                start_rmse,
                end_rmse: state_rmse,
                choices,
            });
            learning_rate *= self.settings.decay;
        }

        info!(
            "recalibration finished after {} sweeps ({} predictions): RMSE {:.2}, converged = {}",
            sweeps.len(),
            queries,
            final_rmse,
            converged
        );

        RecalibrationOutcome {
            parameters: params,
            converged,
            sweeps,
            final_rmse,
            queries,
        }
    }
}
