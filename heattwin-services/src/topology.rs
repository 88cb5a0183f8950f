//! Topology extractor service
//!
//! Answers every twin description on the request topic with the component
//! dependency map extracted from it.

use heattwin_core::diagnosis::extract::topology_from_document;
use log::{info, warn};
use serde_json::Value;

use crate::service::Handler;

/// [`Handler`] for twin-description requests
#[derive(Debug, Default)]
pub struct TopologyService;

impl TopologyService {
    /// New extractor
    pub fn new() -> Self {
        Self
    }
}

impl Handler for TopologyService {
    fn handle(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        let document: Value = match serde_json::from_slice(payload) {
            Ok(document) => document,
            Err(e) => {
                warn!("twin description is not JSON: {}", e);
                return None;
            }
        };
        let Some(topology) = topology_from_document(&document) else {
            warn!("twin description has no `contents`");
            return None;
        };
        info!("extracted {} dependent components", topology.len());
        serde_json::to_vec(&topology).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscriber_depends_on_publisher() {
        let document = json!({"contents": [
            {"@type": "InstanceComponent", "name": "C1", "realization":
                {"@type": "TelemetryRealizationMQTTPublisher", "topic": "c1"}},
            {"@type": "InstanceComponent", "name": "H1", "realization":
                {"@type": "TelemetryRealizationMQTTSubscriber", "topic": "c1"}}
        ]});
        let reply = TopologyService::new().handle(&serde_json::to_vec(&document).unwrap()).unwrap();
        let value: Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(value, json!({"H1": ["C1"]}));
    }

    #[test]
    fn unusable_documents_are_dropped() {
        let mut service = TopologyService::new();
        assert_eq!(service.handle(b"{"), None);
        assert_eq!(service.handle(br#"{"@id": "x"}"#), None);
    }
}
