//! Request/reply over publish/subscribe
//!
//! A call opens a session, subscribes to the reply topic, publishes the
//! request, and returns the first JSON message that arrives on the reply topic
//! before the deadline. Malformed payloads on the reply topic are skipped, not
//! fatal; the call keeps waiting for a well-formed one until time runs out.

use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::{Connect, ConnectionStats, Connector, ConnectorResult};

/// Blocking request/reply client
#[derive(Debug)]
pub struct RpcClient<C: Connect> {
    connect: C,
    timeout: Duration,
    stats: ConnectionStats,
}

impl<C: Connect> RpcClient<C> {
    /// Client opening sessions through `connect`, waiting up to `timeout` per call
    pub fn new(connect: C, timeout: Duration) -> Self {
        Self {
            connect,
            timeout,
            stats: ConnectionStats::default(),
        }
    }

    /// Publish `payload` on `command_topic` and wait for a reply on `reply_topic`
    ///
    /// Returns `None` on timeout or transport failure; both are logged.
    pub fn call(&mut self, command_topic: &str, reply_topic: &str, payload: &[u8]) -> Option<Value> {
        self.stats.calls += 1;
        match self.exchange(command_topic, reply_topic, payload) {
            Ok(Some(reply)) => {
                self.stats.replies += 1;
                Some(reply)
            }
            Ok(None) => {
                self.stats.timeouts += 1;
                warn!(
                    "no reply on `{}` within {:?} (request on `{}`)",
                    reply_topic, self.timeout, command_topic
                );
                None
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!("call on `{}` failed: {}", command_topic, e);
                None
            }
        }
    }

    /// Serialize `request` as JSON and [`call`](Self::call)
    pub fn call_json<T: Serialize>(&mut self, command_topic: &str, reply_topic: &str, request: &T) -> Option<Value> {
        match serde_json::to_vec(request) {
            Ok(payload) => self.call(command_topic, reply_topic, &payload),
            Err(e) => {
                warn!("request for `{}` not serializable: {}", command_topic, e);
                None
            }
        }
    }

    fn exchange(&mut self, command_topic: &str, reply_topic: &str, payload: &[u8]) -> ConnectorResult<Option<Value>> {
        let mut session = self.connect.connect()?;
        session.subscribe(reply_topic)?;
        session.send(command_topic, payload)?;
        debug!("request on `{}` ({} bytes), awaiting `{}`", command_topic, payload.len(), reply_topic);

        let deadline = Instant::now() + self.timeout;
        let reply = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break None;
            }
            let Some(message) = session.receive(remaining)? else {
                break None;
            };
            if message.topic != reply_topic {
                continue;
            }
            match serde_json::from_slice::<Value>(&message.payload) {
                Ok(value) => break Some(value),
                Err(e) => {
                    self.stats.malformed += 1;
                    warn!("dropping malformed reply on `{}`: {}", reply_topic, e);
                }
            }
        };

        session.disconnect();
        Ok(reply)
    }

    /// Call counters so far
    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Reply timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Session factory
    pub fn connector(&self) -> &C {
        &self.connect
    }
}
