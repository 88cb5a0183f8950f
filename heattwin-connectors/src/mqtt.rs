//! MQTT connector for HeatTwin
//!
//! Blocking MQTT sessions over `rumqttc`'s synchronous client. The event loop
//! is driven from the calling thread: every operation polls the connection
//! until the packet it waits for shows up or its deadline passes. Publishes
//! that arrive while waiting for something else are queued and handed out by
//! [`Connector::receive`] in arrival order.
//!
//! All traffic uses QoS 0, matching the request/reply usage: a lost message
//! surfaces as a timeout at the caller, which is the only recovery there is.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use heattwin_core::BrokerConfig;
use log::{debug, error};
use rumqttc::{Client, Connection, Event, MqttOptions, Outgoing, Packet, QoS};

use crate::{Connect, Connector, ConnectorError, ConnectorResult, Message};

/// How long to wait for the broker's CONNACK
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for a SUBACK or for a publish to leave the socket
const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a clean disconnect may take before the session is dropped anyway
const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Request queue capacity of the client
const REQUEST_CAPACITY: usize = 16;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Client id unique within this process and, via the pid, across processes
fn client_id(prefix: &str) -> String {
    let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, std::process::id(), n)
}

/// Session factory for one broker
#[derive(Debug, Clone)]
pub struct MqttConnect {
    config: BrokerConfig,
}

impl MqttConnect {
    /// Factory for the configured broker
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    /// Broker settings
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

impl Connect for MqttConnect {
    type Connector = MqttConnector;

    fn connect(&self) -> ConnectorResult<MqttConnector> {
        MqttConnector::connect(&self.config)
    }
}

/// A live MQTT session
pub struct MqttConnector {
    client: Client,
    connection: Connection,
    pending: VecDeque<Message>,
    connected: bool,
}

impl MqttConnector {
    /// Connect and wait for the broker to accept the session
    pub fn connect(config: &BrokerConfig) -> ConnectorResult<Self> {
        let id = client_id(&config.client_id_prefix);
        let mut options = MqttOptions::new(id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(1)));
        options.set_clean_session(true);
        if let Some(user) = &config.username {
            options.set_credentials(user.clone(), config.password.clone().unwrap_or_default());
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let mut connector = Self {
            client,
            connection,
            pending: VecDeque::new(),
            connected: false,
        };

        let accepted = connector
            .pump(CONNECT_TIMEOUT, |event| matches!(event, Event::Incoming(Packet::ConnAck(_))))
            .map_err(|e| ConnectorError::Connect(format!("{}:{}: {}", config.host, config.port, e)))?;
        if !accepted {
            return Err(ConnectorError::Connect(format!(
                "{}:{}: no CONNACK within {:?}",
                config.host, config.port, CONNECT_TIMEOUT
            )));
        }

        connector.connected = true;
        debug!("mqtt session `{}` connected to {}:{}", id, config.host, config.port);
        Ok(connector)
    }

    /// Poll the event loop until `done` accepts an event or `timeout` passes
    ///
    /// Incoming publishes are queued whatever `done` says. Returns whether
    /// `done` fired.
    fn pump<F>(&mut self, timeout: Duration, mut done: F) -> ConnectorResult<bool>
    where
        F: FnMut(&Event) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.connection.recv_timeout(remaining) {
                Ok(Ok(event)) => {
                    if let Event::Incoming(Packet::Publish(publish)) = &event {
                        self.pending
                            .push_back(Message::new(publish.topic.clone(), publish.payload.to_vec()));
                    }
                    if done(&event) {
                        return Ok(true);
                    }
                }
                Ok(Err(e)) => {
                    self.connected = false;
                    return Err(ConnectorError::Protocol(e.to_string()));
                }
                Err(_) => return Ok(false),
            }
        }
    }
}

impl Connector for MqttConnector {
    fn send(&mut self, topic: &str, payload: &[u8]) -> ConnectorResult<()> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        let publish_error = |reason: String| ConnectorError::Publish {
            topic: topic.to_string(),
            reason,
        };

        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .map_err(|e| publish_error(e.to_string()))?;

        let flushed = self
            .pump(OPERATION_TIMEOUT, |event| matches!(event, Event::Outgoing(Outgoing::Publish(_))))
            .map_err(|e| publish_error(e.to_string()))?;
        if flushed {
            Ok(())
        } else {
            Err(publish_error("not flushed in time".to_string()))
        }
    }

    fn subscribe(&mut self, topic: &str) -> ConnectorResult<()> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        let subscribe_error = |reason: String| ConnectorError::Subscribe {
            topic: topic.to_string(),
            reason,
        };

        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| subscribe_error(e.to_string()))?;

        let acknowledged = self
            .pump(OPERATION_TIMEOUT, |event| matches!(event, Event::Incoming(Packet::SubAck(_))))
            .map_err(|e| subscribe_error(e.to_string()))?;
        if acknowledged {
            Ok(())
        } else {
            Err(subscribe_error("no SUBACK".to_string()))
        }
    }

    fn receive(&mut self, timeout: Duration) -> ConnectorResult<Option<Message>> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        self.pump(timeout, |event| matches!(event, Event::Incoming(Packet::Publish(_))))?;
        Ok(self.pending.pop_front())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Err(e) = self.client.disconnect() {
            error!("mqtt disconnect request failed: {}", e);
            return;
        }
        // Drive the loop until the DISCONNECT packet is out; errors here just
        // mean the socket is already gone
        let _ = self.pump(DISCONNECT_TIMEOUT, |event| {
            matches!(event, Event::Outgoing(Outgoing::Disconnect))
        });
    }
}

impl Drop for MqttConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_are_unique() {
        let a = client_id("heattwin");
        let b = client_id("heattwin");
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("heattwin-{}-", std::process::id())));
    }

    #[test]
    fn unreachable_broker_fails_to_connect() {
        let config = BrokerConfig {
            host: "127.0.0.1".to_string(),
            // reserved port, nothing listens there
            port: 1,
            ..BrokerConfig::default()
        };
        let result = MqttConnect::new(config).connect();
        assert!(matches!(result, Err(ConnectorError::Connect(_))));
    }
}
