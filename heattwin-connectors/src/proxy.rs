//! Plant access over request/reply
//!
//! The real and the predictive plant are external simulators answering on
//! their own topic pairs. A lost or malformed reply becomes empty readings,
//! which the controller treats as "nothing new this step".

use heattwin_core::constants::topics;
use heattwin_core::messages::{PlantCommand, RealPlantCommand};
use heattwin_core::{Plant, Readings};
use log::trace;
use serde::Serialize;

use crate::rpc::RpcClient;
use crate::Connect;

/// Topic pairs of the two plants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantTopics {
    /// Requests to the real plant
    pub real_command: String,
    /// Replies from the real plant
    pub real_reply: String,
    /// Requests to the predictive plant
    pub predicted_command: String,
    /// Replies from the predictive plant
    pub predicted_reply: String,
}

impl Default for PlantTopics {
    fn default() -> Self {
        Self {
            real_command: topics::HEATER_STATUS.to_string(),
            real_reply: topics::SIMULATION_TEMPERATURES.to_string(),
            predicted_command: topics::HEATER_SIMULATION.to_string(),
            predicted_reply: topics::CONTROLLER_SIMULATION_TEMPERATURES.to_string(),
        }
    }
}

/// [`Plant`] implementation over pub/sub
#[derive(Debug)]
pub struct PlantProxy<C: Connect> {
    rpc: RpcClient<C>,
    topics: PlantTopics,
}

impl<C: Connect> PlantProxy<C> {
    /// Proxy on the default topics
    pub fn new(rpc: RpcClient<C>) -> Self {
        Self::with_topics(rpc, PlantTopics::default())
    }

    /// Proxy on custom topics
    pub fn with_topics(rpc: RpcClient<C>, topics: PlantTopics) -> Self {
        Self { rpc, topics }
    }

    /// Underlying client
    pub fn rpc(&self) -> &RpcClient<C> {
        &self.rpc
    }

    /// Topics in use
    pub fn topics(&self) -> &PlantTopics {
        &self.topics
    }

    fn query<T: Serialize>(&mut self, command: &T, real: bool) -> Readings {
        let (command_topic, reply_topic) = if real {
            (&self.topics.real_command, &self.topics.real_reply)
        } else {
            (&self.topics.predicted_command, &self.topics.predicted_reply)
        };
        let readings = self
            .rpc
            .call_json(command_topic, reply_topic, command)
            .map(|reply| Readings::from_reply(&reply))
            .unwrap_or_default();
        trace!("`{}` answered with {} readings", reply_topic, readings.len());
        readings
    }
}

impl<C: Connect> Plant for PlantProxy<C> {
    fn query_real(&mut self, command: &RealPlantCommand) -> Readings {
        self.query(command, true)
    }

    fn query_predicted(&mut self, command: &PlantCommand) -> Readings {
        self.query(command, false)
    }
}
