//! Component dependency graph

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;

use crate::constants::diagnosis::{CONTROLLER_PREFIX, HEATER_PREFIX, LOOKAHEAD_SUFFIX, SENSOR_PREFIX};
use crate::errors::{DiagnosisError, DiagnosisResult};
use crate::traits::{RawTopology, TopologySource};

/// Kind of a diagnosable component, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// Temperature sensor (`T*`)
    Sensor,
    /// Heater (`H*`)
    Heater,
    /// Heater controller (`C*`)
    Controller,
}

impl ComponentKind {
    /// Classify a component by its name prefix
    pub fn classify(name: &str) -> Option<Self> {
        match name.chars().next()? {
            SENSOR_PREFIX => Some(ComponentKind::Sensor),
            HEATER_PREFIX => Some(ComponentKind::Heater),
            CONTROLLER_PREFIX => Some(ComponentKind::Controller),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Sensor => "sensor",
            ComponentKind::Heater => "heater",
            ComponentKind::Controller => "controller",
        };
        f.write_str(name)
    }
}

/// Name of the graph node standing for a sensor's next reading
pub fn lookahead_name(sensor: &str) -> String {
    format!("{}{}", sensor, LOOKAHEAD_SUFFIX)
}

/// Which components feed which
///
/// Nodes are the components the extractor reported inputs for; sensor nodes
/// carry the look-ahead suffix. Inputs that never appear as a node are leaves.
/// The component list is every name mentioned anywhere, ordered by kind and
/// then by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    inputs: BTreeMap<String, Vec<String>>,
    components: Vec<String>,
}

impl DependencyGraph {
    /// Build a graph from the extractor's raw map
    ///
    /// Sensor keys get the look-ahead suffix; input names are kept as they are,
    /// so a sensor input refers to the current reading.
    pub fn from_topology(raw: RawTopology) -> DiagnosisResult<Self> {
        if raw.is_empty() {
            return Err(DiagnosisError::EmptyTopology);
        }

        let names = raw.iter().flat_map(|(key, inputs)| std::iter::once(key).chain(inputs));
        for name in names {
            if ComponentKind::classify(name).is_none() {
                return Err(DiagnosisError::UnknownComponent { name: name.clone() });
            }
        }

        Ok(Self::assemble(raw))
    }

    /// The reference three-zone heating topology
    pub fn canonical() -> Self {
        Self::assemble(canonical_topology())
    }

    fn assemble(raw: RawTopology) -> Self {
        let mut inputs = BTreeMap::new();
        for (key, mut feeding) in raw {
            let node = match ComponentKind::classify(&key) {
                Some(ComponentKind::Sensor) => lookahead_name(&key),
                _ => key,
            };
            let mut seen = BTreeSet::new();
            feeding.retain(|name| seen.insert(name.clone()));
            inputs.insert(node, feeding);
        }

        let mut components: Vec<String> = inputs
            .iter()
            .flat_map(|(node, feeding)| std::iter::once(node).chain(feeding))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        components.sort_by(|a, b| (ComponentKind::classify(a), a).cmp(&(ComponentKind::classify(b), b)));

        debug!("dependency graph: {} nodes, {} components", inputs.len(), components.len());
        Self { inputs, components }
    }

    /// Inputs of a node; `None` for leaves and unknown names
    pub fn inputs(&self, node: &str) -> Option<&[String]> {
        self.inputs.get(node).map(Vec::as_slice)
    }

    /// Whether `name` has recorded inputs
    pub fn is_node(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Nodes with their inputs, in name order
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inputs.iter().map(|(node, feeding)| (node.as_str(), feeding.as_slice()))
    }

    /// Every component, sensors first, then heaters, then controllers
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Look-ahead sensor nodes, i.e. the observations the monitor can report
    pub fn monitored_sensors(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .keys()
            .map(String::as_str)
            .filter(|name| name.ends_with(LOOKAHEAD_SUFFIX) && ComponentKind::classify(name) == Some(ComponentKind::Sensor))
    }

    /// Graph node observed when the monitor reports `sensor`
    pub fn monitored_node(&self, sensor: &str) -> Option<String> {
        let node = lookahead_name(sensor);
        let monitored = self.monitored_sensors().any(|name| name == node);
        monitored.then_some(node)
    }
}

/// Extractor output for the reference building
///
/// ```text
///   TA ─┐    TB ─┐    TC ─┐    TD
///       ├─ C1 ─ H1 ─► TA+1, TB+1
///   TB ─┘
///   TB ─┬─ C2 ─ H2 ─► TB+1, TC+1
///   TC ─┘
///   TC ─┬─ C3 ─ H3 ─► TC+1, TD+1
///   TD ─┘
/// ```
pub fn canonical_topology() -> RawTopology {
    let edges: [(&str, &[&str]); 10] = [
        ("TA", &["H1"]),
        ("TB", &["H1", "H2"]),
        ("TC", &["H2", "H3"]),
        ("TD", &["H3"]),
        ("C1", &["TA", "TB"]),
        ("C2", &["TB", "TC"]),
        ("C3", &["TC", "TD"]),
        ("H1", &["C1"]),
        ("H2", &["C2"]),
        ("H3", &["C3"]),
    ];
    edges
        .iter()
        .map(|(node, inputs)| (node.to_string(), inputs.iter().map(|s| s.to_string()).collect()))
        .collect()
}

/// Topology source serving the reference building without a network round trip
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalTopology;

impl TopologySource for CanonicalTopology {
    fn fetch_topology(&mut self) -> Option<RawTopology> {
        Some(canonical_topology())
    }
}
