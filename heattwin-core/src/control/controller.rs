//! The controller state machine

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ControllerConfig;
use crate::control::policy::{decide_heaters, PolicyKind};
use crate::control::session::ControlSession;
use crate::divergence::{Divergence, DivergenceMonitor};
use crate::errors::ConfigResult;
use crate::messages::{PlantCommand, RealPlantCommand};
use crate::model::{HeaterCommand, Readings, Sensor, ThermalParameters};
use crate::recalibrate::{RecalibrationOutcome, Recalibrator};
use crate::traits::Plant;

/// What one control step did
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Index of the step (0-based)
    pub step: u64,
    /// Simulated time at the start of the step (s)
    pub elapsed: f64,
    /// Command sent to the real plant
    pub heater: HeaterCommand,
    /// Model/plant comparison (predictive policy only)
    pub divergence: Option<Divergence>,
    /// Recalibration run during the step, if any
    pub recalibration: Option<RecalibrationOutcome>,
    /// True when the real plant did not answer
    pub real_reply_missing: bool,
}

/// Totals over a complete run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Steps executed
    pub steps: u64,
    /// Last published RMSE
    pub published_rmse: f64,
    /// Number of recalibrations
    pub recalibrations: usize,
    /// Real-plant queries that got no reply
    pub missing_replies: usize,
    /// Final controller readings
    pub final_readings: Readings,
    /// Final model parameters
    pub model: ThermalParameters,
}

/// Multiplicative drift of the real external coefficients
#[derive(Debug, Clone)]
struct ParameterDrift {
    span: f64,
    rng: StdRng,
}

impl ParameterDrift {
    fn new(span: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { span, rng }
    }

    fn apply(&mut self, params: &mut ThermalParameters) {
        if self.span <= 0.0 {
            return;
        }
        let span = self.span;
        let rng = &mut self.rng;
        params.scale_external(|_| 1.0 + rng.gen::<f64>() * span);
    }
}

/// Heater controller with an internal predictive model
///
/// Owns the current readings, the command history, both parameter sets and
/// the divergence state. Plants are passed in per call, so the controller can
/// be driven against pub/sub proxies or in-process fakes alike.
#[derive(Debug, Clone)]
pub struct Controller {
    session: ControlSession,
    policy: PolicyKind,
    max_heater_power: f64,
    readings: Readings,
    history: BTreeMap<String, Vec<f64>>,
    time_history: Vec<f64>,
    heater: HeaterCommand,
    environment: f64,
    real: ThermalParameters,
    model: ThermalParameters,
    predictions: Vec<Readings>,
    comparison: Readings,
    monitor: DivergenceMonitor,
    recalibrator: Recalibrator,
    drift: ParameterDrift,
    recalibrations: usize,
    missing_replies: usize,
}

impl Controller {
    /// Build a controller from validated configuration
    pub fn new(config: &ControllerConfig) -> ConfigResult<Self> {
        config.validate()?;

        let readings = Readings::initial();
        let history = readings.iter().map(|(k, _)| (k.to_string(), Vec::new())).collect();

        Ok(Self {
            session: ControlSession::from_config(config),
            policy: config.policy,
            max_heater_power: config.max_heater_power,
            comparison: readings.clone(),
            readings,
            history,
            time_history: Vec::new(),
            heater: HeaterCommand::off(),
            environment: config.environment_temperature,
            real: config.real.clone(),
            model: config.model.clone(),
            predictions: vec![Readings::zero_sensors()],
            monitor: DivergenceMonitor::new(config.divergence),
            recalibrator: Recalibrator::new(config.recalibration),
            drift: ParameterDrift::new(config.drift_span, config.seed),
            recalibrations: 0,
            missing_replies: 0,
        })
    }

    /// Step until the session's stop time
    pub fn run<P: Plant>(&mut self, plant: &mut P) -> RunSummary {
        info!(
            "starting {} control run: target {:.1} °C, stop at {} s, step {} s",
            self.policy, self.session.target_temperature, self.session.stop_time, self.session.delta_t
        );
        while !self.session.is_finished() {
            self.step(plant);
        }
        self.summary()
    }

    /// Execute one control step with the configured policy
    pub fn step<P: Plant>(&mut self, plant: &mut P) -> StepReport {
        match self.policy {
            PolicyKind::Reactive => self.step_reactive(plant),
            PolicyKind::Predictive => self.step_predictive(plant),
        }
    }

    fn step_reactive<P: Plant>(&mut self, plant: &mut P) -> StepReport {
        let step = self.session.step_index();
        let elapsed = self.session.elapsed();

        let mut command = decide_heaters(
            &self.readings,
            self.session.target_temperature,
            self.max_heater_power,
            &self.heater,
        );
        self.session.fault_schedule.apply(&mut command, elapsed);
        self.heater = command;

        let real = plant.query_real(&self.real_command());
        let real_reply_missing = self.absorb(&real, elapsed);

        StepReport {
            step,
            elapsed,
            heater: self.heater.clone(),
            divergence: None,
            recalibration: None,
            real_reply_missing,
        }
    }

    fn step_predictive<P: Plant>(&mut self, plant: &mut P) -> StepReport {
        let step = self.session.step_index();
        let elapsed = self.session.elapsed();
        let delta_t = self.session.delta_t;

        // Look ahead with the command currently in force
        let look_ahead = plant.query_predicted(&PlantCommand::new(&self.heater, &self.readings, delta_t, &self.model));
        self.heater = decide_heaters(
            &look_ahead,
            self.session.target_temperature,
            self.max_heater_power,
            &self.heater,
        );

        // Same command for both sides of the comparison
        let predicted = plant.query_predicted(&PlantCommand::new(&self.heater, &self.readings, delta_t, &self.model));
        let real = plant.query_real(&self.real_command());
        self.comparison.merge_known(&real);

        let divergence = self.monitor.assess(&predicted, &real);
        let recalibration = if divergence.needs_recalibration() {
            info!("RMSE {:.2} too high, recalibrating the predictive model", divergence.rmse());
            for sensor in Sensor::ALL {
                debug!(
                    "prediction for {}: {:.3}, actual: {:.3}",
                    sensor,
                    predicted.sensor_or_zero(sensor),
                    real.sensor_or_zero(sensor)
                );
            }

            let (heater, readings) = (&self.heater, &self.readings);
            let outcome = self.recalibrator.run(&self.model, &self.comparison, |params| {
                plant.query_predicted(&PlantCommand::new(heater, readings, delta_t, params))
            });
            self.model = outcome.parameters.clone();
            self.recalibrations += 1;
            Some(outcome)
        } else {
            None
        };

        self.predictions.push(predicted);
        let real_reply_missing = self.absorb(&real, elapsed);
        self.drift.apply(&mut self.real);

        StepReport {
            step,
            elapsed,
            heater: self.heater.clone(),
            divergence: Some(divergence),
            recalibration,
            real_reply_missing,
        }
    }

    fn real_command(&self) -> RealPlantCommand {
        let command = PlantCommand::new(&self.heater, &self.readings, self.session.delta_t, &self.real);
        let empty = Readings::new();
        let last_prediction = self.predictions.last().unwrap_or(&empty);
        RealPlantCommand::new(command, self.monitor.published_rmse(), last_prediction, self.environment)
    }

    /// Fold a real-plant reply into the controller state and close the step
    fn absorb(&mut self, real: &Readings, elapsed: f64) -> bool {
        let missing = real.is_empty();
        if missing {
            warn!("no reply from the real plant at t = {} s; keeping previous readings", elapsed);
            self.missing_replies += 1;
        }

        for key in self.readings.merge_known(real) {
            if let (Some(series), Some(value)) = (self.history.get_mut(&key), real.get(&key)) {
                series.push(value);
            }
        }
        if let Some(environment) = real.environment() {
            self.environment = environment;
        }
        self.time_history.push(elapsed);
        self.session.advance();
        missing
    }

    fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.session.step_index(),
            published_rmse: self.monitor.published_rmse(),
            recalibrations: self.recalibrations,
            missing_replies: self.missing_replies,
            final_readings: self.readings.clone(),
            model: self.model.clone(),
        }
    }

    /// The run session
    pub fn session(&self) -> &ControlSession {
        &self.session
    }

    /// Policy in use
    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    /// Current zone and sensor temperatures
    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    /// Recorded values of one zone or sensor, oldest first
    pub fn history(&self, key: &str) -> Option<&[f64]> {
        self.history.get(key).map(Vec::as_slice)
    }

    /// Elapsed time of every completed step (s)
    pub fn time_history(&self) -> &[f64] {
        &self.time_history
    }

    /// Command currently in force
    pub fn heater(&self) -> &HeaterCommand {
        &self.heater
    }

    /// Last known outside temperature
    pub fn environment(&self) -> f64 {
        self.environment
    }

    /// Ground-truth parameters (drifting)
    pub fn real_parameters(&self) -> &ThermalParameters {
        &self.real
    }

    /// Model parameters (recalibrated)
    pub fn model(&self) -> &ThermalParameters {
        &self.model
    }

    /// Comparison predictions, oldest first; starts with an all-zero snapshot
    pub fn predictions(&self) -> &[Readings] {
        &self.predictions
    }

    /// Last published RMSE
    pub fn published_rmse(&self) -> f64 {
        self.monitor.published_rmse()
    }
}
