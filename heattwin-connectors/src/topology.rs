//! Topology retrieval from the extractor service
//!
//! The twin description is sent verbatim to the extractor, which answers with
//! a JSON object mapping every component to its upstream components.

use std::fs;
use std::io;
use std::path::Path;

use heattwin_core::constants::topics;
use heattwin_core::traits::RawTopology;
use heattwin_core::TopologySource;
use log::{info, warn};

use crate::rpc::RpcClient;
use crate::Connect;

/// [`TopologySource`] asking the extractor over pub/sub
#[derive(Debug)]
pub struct TopologyClient<C: Connect> {
    rpc: RpcClient<C>,
    document: Vec<u8>,
    request_topic: String,
    reply_topic: String,
}

impl<C: Connect> TopologyClient<C> {
    /// Client sending `document` on the default extractor topics
    pub fn new(rpc: RpcClient<C>, document: Vec<u8>) -> Self {
        Self {
            rpc,
            document,
            request_topic: topics::TOPOLOGY_REQUEST.to_string(),
            reply_topic: topics::TOPOLOGY_REPLY.to_string(),
        }
    }

    /// Client sending the contents of the file at `path`
    pub fn from_file(rpc: RpcClient<C>, path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(rpc, fs::read(path)?))
    }

    /// Override the request and reply topics
    pub fn with_topics(mut self, request_topic: impl Into<String>, reply_topic: impl Into<String>) -> Self {
        self.request_topic = request_topic.into();
        self.reply_topic = reply_topic.into();
        self
    }

    /// Underlying client
    pub fn rpc(&self) -> &RpcClient<C> {
        &self.rpc
    }
}

impl<C: Connect> TopologySource for TopologyClient<C> {
    fn fetch_topology(&mut self) -> Option<RawTopology> {
        let reply = self.rpc.call(&self.request_topic, &self.reply_topic, &self.document)?;
        match serde_json::from_value::<RawTopology>(reply) {
            Ok(topology) => {
                info!("received topology with {} components", topology.len());
                Some(topology)
            }
            Err(e) => {
                warn!("topology reply on `{}` is not a component map: {}", self.reply_topic, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;
    use std::io::Write;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[test]
    fn parses_component_map() {
        let bus = MemoryBus::new();
        bus.respond(topics::TOPOLOGY_REQUEST, topics::TOPOLOGY_REPLY, |_| {
            Some(br#"{"H1": ["C1"], "C1": ["TA", "TB"]}"#.to_vec())
        });
        let mut client = TopologyClient::new(RpcClient::new(bus, TIMEOUT), b"{}".to_vec());

        let topology = client.fetch_topology().unwrap();
        assert_eq!(topology["C1"], vec!["TA".to_string(), "TB".to_string()]);
    }

    #[test]
    fn wrong_shape_is_none() {
        let bus = MemoryBus::new();
        bus.respond("graph/in", "graph/out", |_| Some(br#"{"H1": "C1"}"#.to_vec()));
        let mut client =
            TopologyClient::new(RpcClient::new(bus, TIMEOUT), b"{}".to_vec()).with_topics("graph/in", "graph/out");

        assert_eq!(client.fetch_topology(), None);
        assert_eq!(client.rpc().stats().replies, 1);
    }

    #[test]
    fn document_is_sent_verbatim() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"contents": []}}"#).unwrap();
        let bus = MemoryBus::new();
        let mut client = TopologyClient::from_file(RpcClient::new(bus.clone(), TIMEOUT), file.path()).unwrap();

        assert_eq!(client.fetch_topology(), None);
        let sent = bus.published_on(topics::TOPOLOGY_REQUEST);
        assert_eq!(sent[0].payload, br#"{"contents": []}"#.to_vec());
    }
}
