//! Pub/Sub Connectors and Request/Reply Plumbing
//!
//! ## Overview
//!
//! Every interaction between HeatTwin services is a JSON message on a
//! publish/subscribe topic. This crate provides:
//!
//! - [`Connector`]: one live pub/sub session (publish, subscribe, receive)
//! - [`Connect`]: a factory opening fresh sessions
//! - [`mqtt`]: the broker-backed transport (feature `mqtt`, on by default)
//! - [`memory`]: an in-process bus for tests and single-process setups
//! - [`RpcClient`]: request/reply on top of any transport
//! - [`PlantProxy`] and [`TopologyClient`]: the core crate's `Plant` and
//!   `TopologySource` seams, implemented over RPC
//!
//! ## Request/Reply
//!
//! ```text
//!  caller              RpcClient                    broker / bus
//!    │  call(cmd, reply)   │                             │
//!    │────────────────────►│ connect                     │
//!    │                     │ subscribe(reply) ──────────►│
//!    │                     │ publish(cmd, payload) ─────►│
//!    │                     │◄──────── first message on reply
//!    │                     │ disconnect                  │
//!    │◄──── Some(json) ────│        (or None after the timeout)
//! ```
//!
//! Each call opens and tears down its own session, so concurrent callers never
//! see each other's replies and there is never more than one outstanding call
//! per connection. Timeouts and malformed replies are not errors: they are
//! logged and the call yields `None`. Nothing is retried.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use heattwin_connectors::{memory::MemoryBus, RpcClient};
//!
//! let bus = MemoryBus::new();
//! bus.respond("echo/request", "echo/reply", |payload| Some(payload.to_vec()));
//!
//! let mut rpc = RpcClient::new(bus, Duration::from_secs(1));
//! let reply = rpc.call("echo/request", "echo/reply", br#"{"ping": true}"#);
//! assert_eq!(reply, Some(serde_json::json!({"ping": true})));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod memory;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod proxy;
pub mod rpc;
pub mod topology;

use std::time::Duration;

use thiserror::Error;

// Re-export common types
pub use memory::{MemoryBus, MemoryConnector};
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConnect, MqttConnector};
pub use proxy::{PlantProxy, PlantTopics};
pub use rpc::RpcClient;
pub use topology::TopologyClient;

/// Transport failures
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The session is closed
    #[error("not connected")]
    NotConnected,

    /// The broker could not be reached or refused the session
    #[error("connection failed: {0}")]
    Connect(String),

    /// A subscription was not acknowledged
    #[error("subscribe to `{topic}` failed: {reason}")]
    Subscribe {
        /// Topic filter
        topic: String,
        /// Transport message
        reason: String,
    },

    /// A message could not be handed to the transport
    #[error("publish to `{topic}` failed: {reason}")]
    Publish {
        /// Destination topic
        topic: String,
        /// Transport message
        reason: String,
    },

    /// The session broke while waiting for traffic
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for transport operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// A message received from a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message was published on
    pub topic: String,
    /// Raw payload
    pub payload: Vec<u8>,
}

impl Message {
    /// Build a message
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// One pub/sub session
///
/// All operations block the calling thread.
pub trait Connector {
    /// Publish `payload` on `topic`
    fn send(&mut self, topic: &str, payload: &[u8]) -> ConnectorResult<()>;

    /// Start receiving messages published on `topic`; returns once the
    /// subscription is active
    fn subscribe(&mut self, topic: &str) -> ConnectorResult<()>;

    /// Wait up to `timeout` for the next message on any subscribed topic
    fn receive(&mut self, timeout: Duration) -> ConnectorResult<Option<Message>>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the session; further sends fail with [`ConnectorError::NotConnected`]
    fn disconnect(&mut self);
}

/// Opens fresh [`Connector`] sessions
pub trait Connect {
    /// Session type
    type Connector: Connector;

    /// Open a new session
    fn connect(&self) -> ConnectorResult<Self::Connector>;
}

/// Request/reply statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Calls issued
    pub calls: u64,
    /// Calls answered with a well-formed reply
    pub replies: u64,
    /// Calls that ran into the deadline
    pub timeouts: u64,
    /// Replies dropped because they were not JSON
    pub malformed: u64,
    /// Calls aborted by a transport error
    pub failures: u64,
}
