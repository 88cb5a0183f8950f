//! Seams to the external collaborators
//!
//! The controller and the diagnosis engine never see the network. They are
//! handed something that can answer a plant query or produce a dependency
//! graph, and the connectors crate supplies implementations that do it over
//! pub/sub. Tests supply in-process ones.

use std::collections::BTreeMap;

use crate::messages::{PlantCommand, RealPlantCommand};
use crate::model::Readings;

/// Access to the ground-truth plant and to the predictive plant
///
/// Both queries block until the plant answers or the transport gives up. A
/// query that got no answer returns empty [`Readings`]; callers must tolerate
/// missing fields rather than expect an error.
pub trait Plant {
    /// Advance the real plant by one step with the real parameter set
    fn query_real(&mut self, command: &RealPlantCommand) -> Readings;

    /// Simulate one step with the controller's model parameter set
    fn query_predicted(&mut self, command: &PlantCommand) -> Readings;
}

impl<P: Plant + ?Sized> Plant for &mut P {
    fn query_real(&mut self, command: &RealPlantCommand) -> Readings {
        (**self).query_real(command)
    }

    fn query_predicted(&mut self, command: &PlantCommand) -> Readings {
        (**self).query_predicted(command)
    }
}

/// Raw topology as produced by the extractor: component → upstream components
pub type RawTopology = BTreeMap<String, Vec<String>>;

/// Producer of the component dependency graph
pub trait TopologySource {
    /// Fetch the publisher/subscriber graph; `None` if nothing arrived
    fn fetch_topology(&mut self) -> Option<RawTopology>;
}

impl<T: TopologySource + ?Sized> TopologySource for Box<T> {
    fn fetch_topology(&mut self) -> Option<RawTopology> {
        (**self).fetch_topology()
    }
}
