//! Pub/Sub Topic Names
//!
//! Every reply topic is one-shot: the requester subscribes right before
//! publishing and drops the subscription after the first reply or a timeout.

/// Controller → real plant: heater command plus real parameters.
pub const HEATER_STATUS: &str = "controller/heater_status";

/// Real plant → controller: zone and sensor temperatures.
pub const SIMULATION_TEMPERATURES: &str = "simulation/temperatures";

/// Controller → predictive plant: heater command plus model parameters.
pub const HEATER_SIMULATION: &str = "controller/heater_simulation";

/// Predictive plant → controller: predicted sensor temperatures.
pub const CONTROLLER_SIMULATION_TEMPERATURES: &str = "controller_simulation/temperatures";

/// Monitor → diagnosis engine: anomaly reports.
pub const MONITOR_ALERT: &str = "monitor/alert";

/// Diagnosis engine → downstream consumers.
pub const DIAGNOSIS_OUTPUT: &str = "diagnosis/output";

/// Diagnosis engine → topology extractor: raw twin description.
pub const TOPOLOGY_REQUEST: &str = "dtdl2graph/request";

/// Topology extractor → diagnosis engine: component → upstream components.
pub const TOPOLOGY_REPLY: &str = "dtdl2graph/reply";
