//! Dependency extraction from a twin description
//!
//! A twin description is a JSON document whose `contents` tree declares
//! component instances (`"@type": "InstanceComponent"`, with a `name`) and,
//! nested anywhere below them, telemetry realizations that publish to or
//! subscribe from pub/sub topics:
//!
//! ```json
//! { "@type": "InstanceComponent", "name": "H1",
//!   "realization": [
//!     { "@type": "TelemetryRealizationMQTTSubscriber", "topic": "c1/out" },
//!     { "@type": "TelemetryRealizationMQTTPublisher",  "topic": "h1/out" } ] }
//! ```
//!
//! A subscriber depends on every component publishing to one of its topics.
//! The result is the raw topology the diagnosis engine consumes.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::traits::RawTopology;

const INSTANCE_COMPONENT: &str = "InstanceComponent";
const MQTT_PUBLISHER: &str = "TelemetryRealizationMQTTPublisher";
const MQTT_SUBSCRIBER: &str = "TelemetryRealizationMQTTSubscriber";

type TopicMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Default)]
struct Realizations {
    publishers: TopicMap,
    subscribers: TopicMap,
}

impl Realizations {
    fn collect(&mut self, item: &Value, owner: Option<&str>) {
        match item {
            Value::Object(fields) => {
                let owner = if fields.get("@type").and_then(Value::as_str) == Some(INSTANCE_COMPONENT) {
                    fields.get("name").and_then(Value::as_str).or(owner)
                } else {
                    owner
                };

                if let Some(owner) = owner {
                    let realizations = match fields.get("realization") {
                        Some(Value::Array(list)) => list.iter().collect(),
                        Some(single) => vec![single],
                        None => Vec::new(),
                    };
                    for realization in realizations {
                        self.record(owner, realization);
                    }
                }

                for value in fields.values() {
                    self.collect(value, owner);
                }
            }
            Value::Array(items) => {
                for value in items {
                    self.collect(value, owner);
                }
            }
            _ => {}
        }
    }

    fn record(&mut self, owner: &str, realization: &Value) {
        let Some(topic) = realization.get("topic").and_then(Value::as_str) else {
            return;
        };
        let map = match realization.get("@type").and_then(Value::as_str) {
            Some(MQTT_PUBLISHER) => &mut self.publishers,
            Some(MQTT_SUBSCRIBER) => &mut self.subscribers,
            _ => return,
        };
        map.entry(owner.to_string()).or_default().insert(topic.to_string());
    }
}

/// Map every subscribing component to the components publishing on its topics
///
/// `contents` is the `contents` tree of a twin description. Publishers are
/// listed in name order, each at most once.
pub fn extract_connections(contents: &Value) -> RawTopology {
    let mut found = Realizations::default();
    found.collect(contents, None);

    found
        .subscribers
        .iter()
        .filter_map(|(subscriber, topics)| {
            let upstream: Vec<String> = found
                .publishers
                .iter()
                .filter(|(_, published)| !published.is_disjoint(topics))
                .map(|(publisher, _)| publisher.clone())
                .collect();
            (!upstream.is_empty()).then(|| (subscriber.clone(), upstream))
        })
        .collect()
}

/// Extract the topology of a complete twin description document
///
/// Returns `None` when the document has no `contents`.
pub fn topology_from_document(document: &Value) -> Option<RawTopology> {
    document.get("contents").map(extract_connections)
}
