//! Divergence between the predictive model and the real plant
//!
//! After every predictive step the controller holds two snapshots taken with
//! the same heater command: what the model predicted and what the plant did.
//! Their root-mean-square error over the four sensor channels is the single
//! health metric of the model.
//!
//! ## Policy
//!
//! ```text
//!   rmse >= 10            outlier, discarded (not published, no recalibration)
//!   0.45 < rmse < 10      published, recalibration triggered
//!   rmse <= 0.45          published
//! ```
//!
//! Zones are deliberately not part of the score: only sensor channels are
//! observable in a real building.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::divergence::{CONVERGENCE_RMSE, OUTLIER_RMSE, RECALIBRATION_TRIGGER_RMSE};
use crate::model::{Readings, Sensor};

/// Root-mean-square error between two snapshots over TA..TD
///
/// A channel missing from either side counts as zero, so a timed-out query
/// scores badly instead of failing.
pub fn rmse(a: &Readings, b: &Readings) -> f64 {
    let sum: f64 = Sensor::ALL
        .iter()
        .map(|&s| {
            let diff = a.sensor_or_zero(s) - b.sensor_or_zero(s);
            diff * diff
        })
        .sum();
    (sum / Sensor::ALL.len() as f64).sqrt()
}

/// RMSE thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DivergenceThresholds {
    /// At or above: numerical artifact, discarded
    pub outlier: f64,
    /// Above: recalibrate the model
    pub trigger: f64,
    /// Below: recalibration search has converged
    pub convergence: f64,
}

impl Default for DivergenceThresholds {
    fn default() -> Self {
        Self {
            outlier: OUTLIER_RMSE,
            trigger: RECALIBRATION_TRIGGER_RMSE,
            convergence: CONVERGENCE_RMSE,
        }
    }
}

/// Classification of one prediction/outcome comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Divergence {
    /// Non-physical value, ignored
    Outlier(f64),
    /// Model is good enough
    WithinTolerance(f64),
    /// Model has drifted; recalibrate
    Diverged(f64),
}

impl Divergence {
    /// The underlying RMSE
    pub fn rmse(&self) -> f64 {
        match *self {
            Divergence::Outlier(v) | Divergence::WithinTolerance(v) | Divergence::Diverged(v) => v,
        }
    }

    /// Whether the recalibrator should run
    pub fn needs_recalibration(&self) -> bool {
        matches!(self, Divergence::Diverged(_))
    }
}

/// Scores predictions and keeps the last published error metric
#[derive(Debug, Clone, Default)]
pub struct DivergenceMonitor {
    thresholds: DivergenceThresholds,
    published: f64,
}

impl DivergenceMonitor {
    /// Monitor with custom thresholds
    pub fn new(thresholds: DivergenceThresholds) -> Self {
        Self {
            thresholds,
            published: 0.0,
        }
    }

    /// Compare a prediction with the matching real outcome
    ///
    /// Non-outlier values become the published metric.
    pub fn assess(&mut self, predicted: &Readings, actual: &Readings) -> Divergence {
        let value = rmse(actual, predicted);
        info!("RMSE: {:.2}", value);

        if value >= self.thresholds.outlier {
            warn!("discarding outlier RMSE {:.2}", value);
            return Divergence::Outlier(value);
        }

        self.published = value;
        if value > self.thresholds.trigger {
            Divergence::Diverged(value)
        } else {
            Divergence::WithinTolerance(value)
        }
    }

    /// Last published RMSE (0 before the first comparison)
    pub fn published_rmse(&self) -> f64 {
        self.published
    }

    /// Configured thresholds
    pub fn thresholds(&self) -> &DivergenceThresholds {
        &self.thresholds
    }
}
