//! Diagnosis service
//!
//! Listens for monitor alerts and publishes the minimal diagnoses of every
//! genuine alert. The dependency graph comes either from the built-in
//! heating-zone topology or from the topology extractor, fetched on the first
//! alert that needs it.

use heattwin_core::messages::AlertMessage;
use heattwin_core::{DiagnosisEngine, TopologySource};
use log::{error, warn};

use crate::service::Handler;

/// [`Handler`] for `monitor/alert` messages
pub struct DiagnosisService<S> {
    engine: DiagnosisEngine<S>,
}

impl<S: TopologySource> DiagnosisService<S> {
    /// Service diagnosing against the graph `source` provides
    pub fn new(source: S) -> Self {
        Self::with_engine(DiagnosisEngine::new(source))
    }

    /// Service around a prepared engine
    pub fn with_engine(engine: DiagnosisEngine<S>) -> Self {
        Self { engine }
    }

    /// The engine, with its cache and statistics
    pub fn engine(&self) -> &DiagnosisEngine<S> {
        &self.engine
    }
}

impl<S: TopologySource> Handler for DiagnosisService<S> {
    fn handle(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        let alert: AlertMessage = match serde_json::from_slice(payload) {
            Ok(alert) => alert,
            Err(e) => {
                warn!("dropping malformed alert: {}", e);
                return None;
            }
        };

        let output = match self.engine.handle_alert(&alert) {
            Ok(output) => output?,
            Err(e) => {
                error!("cannot diagnose {:?}: {}", alert.problematic_sensors, e);
                return None;
            }
        };

        match serde_json::to_vec(&output) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("diagnosis output not serializable: {}", e);
                None
            }
        }
    }
}
