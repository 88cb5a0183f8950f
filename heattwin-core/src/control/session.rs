//! Run parameters and step counter of one control run

use crate::config::ControllerConfig;
use crate::control::policy::FaultSchedule;

/// Owns everything that used to be process-wide run state: target, fault
/// schedule, timing and the current step index
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSession {
    /// Target temperature for every zone (°C)
    pub target_temperature: f64,
    /// Stuck-off heater failures
    pub fault_schedule: FaultSchedule,
    /// Simulated time at which the run ends (s)
    pub stop_time: f64,
    /// Simulated time per step (s)
    pub delta_t: f64,
    step_index: u64,
}

impl ControlSession {
    /// Fresh session at step 0
    pub fn new(target_temperature: f64, fault_schedule: FaultSchedule, stop_time: f64, delta_t: f64) -> Self {
        Self {
            target_temperature,
            fault_schedule,
            stop_time,
            delta_t,
            step_index: 0,
        }
    }

    /// Session described by a controller configuration
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            config.target_temperature,
            config.fault_schedule.clone(),
            config.stop_time,
            config.delta_t,
        )
    }

    /// Number of completed steps
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    /// Simulated time elapsed before the current step (s)
    pub fn elapsed(&self) -> f64 {
        self.step_index as f64 * self.delta_t
    }

    /// True once elapsed time has reached the stop time
    pub fn is_finished(&self) -> bool {
        self.elapsed() >= self.stop_time
    }

    /// Record a completed step
    pub fn advance(&mut self) {
        self.step_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finishes_at_stop_time() {
        let mut session = ControlSession::new(20.0, FaultSchedule::new(), 1000.0, 200.0);
        let mut steps = 0;
        while !session.is_finished() {
            session.advance();
            steps += 1;
        }
        assert_eq!(steps, 5);
        assert_eq!(session.elapsed(), 1000.0);
    }

    #[test]
    fn partial_last_step_still_runs() {
        let mut session = ControlSession::new(20.0, FaultSchedule::new(), 500.0, 200.0);
        let mut steps = 0;
        while !session.is_finished() {
            session.advance();
            steps += 1;
        }
        assert_eq!(steps, 3);
    }
}
