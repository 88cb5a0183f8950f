//! In-process pub/sub bus
//!
//! A [`MemoryBus`] routes messages between [`MemoryConnector`] sessions of the
//! same process through `mpsc` channels. Topics match exactly; there are no
//! wildcards. Responders can be registered to answer a command topic
//! synchronously, which is how tests stand in for external services.
//!
//! Every published message is also recorded for later inspection.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

use crate::{Connect, Connector, ConnectorError, ConnectorResult, Message};

type Handler = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

struct Subscription {
    session: u64,
    topic: String,
    sender: Sender<Message>,
}

struct Responder {
    command_topic: String,
    reply_topic: String,
    handler: Handler,
}

#[derive(Default)]
struct BusState {
    subscriptions: Vec<Subscription>,
    responders: Vec<Responder>,
    published: Vec<Message>,
    next_session: u64,
}

/// Shared in-process message bus; clones refer to the same bus
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryBus")
            .field("subscriptions", &state.subscriptions.len())
            .field("responders", &state.responders.len())
            .field("published", &state.published.len())
            .finish()
    }
}

impl MemoryBus {
    /// Empty bus
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking test thread must not take the whole bus down with it
    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer every message on `command_topic` with the handler's output,
    /// published on `reply_topic`; `None` means no answer
    pub fn respond<F>(&self, command_topic: &str, reply_topic: &str, handler: F)
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.lock().responders.push(Responder {
            command_topic: command_topic.to_string(),
            reply_topic: reply_topic.to_string(),
            handler: Arc::new(handler),
        });
    }

    /// Deliver a message to every subscriber of `topic`, then run responders
    pub fn publish(&self, topic: &str, payload: &[u8]) {
        let handlers: Vec<(String, Handler)> = {
            let mut state = self.lock();
            let message = Message::new(topic, payload);
            state.published.push(message.clone());

            let mut delivered = 0;
            state.subscriptions.retain(|sub| {
                if sub.topic != topic {
                    return true;
                }
                delivered += 1;
                // a dropped receiver means the session is gone
                sub.sender.send(message.clone()).is_ok()
            });
            trace!("bus: `{}` delivered to {} subscribers", topic, delivered);

            state
                .responders
                .iter()
                .filter(|r| r.command_topic == topic)
                .map(|r| (r.reply_topic.clone(), Arc::clone(&r.handler)))
                .collect()
        };

        for (reply_topic, handler) in handlers {
            match handler(payload) {
                Some(reply) => self.publish(&reply_topic, &reply),
                None => debug!("bus: responder on `{}` stayed silent", topic),
            }
        }
    }

    /// Every message published so far, oldest first
    pub fn published(&self) -> Vec<Message> {
        self.lock().published.clone()
    }

    /// Messages published on one topic, oldest first
    pub fn published_on(&self, topic: &str) -> Vec<Message> {
        self.lock()
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions.len()
    }

    /// Open a session on this bus
    pub fn connector(&self) -> MemoryConnector {
        let session = {
            let mut state = self.lock();
            state.next_session += 1;
            state.next_session
        };
        let (sender, receiver) = mpsc::channel();
        MemoryConnector {
            bus: self.clone(),
            session,
            sender,
            receiver,
            connected: true,
        }
    }

    fn unsubscribe_session(&self, session: u64) {
        self.lock().subscriptions.retain(|sub| sub.session != session);
    }
}

impl Connect for MemoryBus {
    type Connector = MemoryConnector;

    fn connect(&self) -> ConnectorResult<MemoryConnector> {
        Ok(self.connector())
    }
}

/// One session on a [`MemoryBus`]
pub struct MemoryConnector {
    bus: MemoryBus,
    session: u64,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    connected: bool,
}

impl Connector for MemoryConnector {
    fn send(&mut self, topic: &str, payload: &[u8]) -> ConnectorResult<()> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        self.bus.publish(topic, payload);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> ConnectorResult<()> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        self.bus.lock().subscriptions.push(Subscription {
            session: self.session,
            topic: topic.to_string(),
            sender: self.sender.clone(),
        });
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> ConnectorResult<Option<Message>> {
        if !self.connected {
            return Err(ConnectorError::NotConnected);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ConnectorError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.bus.unsubscribe_session(self.session);
        }
    }
}

impl Drop for MemoryConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn delivers_to_matching_subscribers_only() {
        let bus = MemoryBus::new();
        let mut a = bus.connector();
        let mut b = bus.connector();
        a.subscribe("x").unwrap();
        b.subscribe("y").unwrap();

        bus.publish("x", b"1");

        assert_eq!(a.receive(SHORT).unwrap(), Some(Message::new("x", b"1".to_vec())));
        assert_eq!(b.receive(SHORT).unwrap(), None);
    }

    #[test]
    fn responder_answers_on_reply_topic() {
        let bus = MemoryBus::new();
        bus.respond("cmd", "reply", |payload| Some([payload, b"!"].concat()));
        let mut client = bus.connector();
        client.subscribe("reply").unwrap();

        client.send("cmd", b"hi").unwrap();

        let reply = client.receive(SHORT).unwrap().unwrap();
        assert_eq!(reply.payload, b"hi!".to_vec());
        assert_eq!(bus.published().len(), 2);
        assert_eq!(bus.published_on("cmd").len(), 1);
    }

    #[test]
    fn disconnect_drops_subscriptions() {
        let bus = MemoryBus::new();
        let mut client = bus.connector();
        client.subscribe("x").unwrap();
        assert_eq!(bus.subscription_count(), 1);

        client.disconnect();

        assert_eq!(bus.subscription_count(), 0);
        assert!(matches!(client.send("x", b""), Err(ConnectorError::NotConnected)));
    }

    #[test]
    fn dropped_session_unsubscribes() {
        let bus = MemoryBus::new();
        {
            let mut client = bus.connector();
            client.subscribe("x").unwrap();
        }
        assert_eq!(bus.subscription_count(), 0);
        bus.publish("x", b"nobody listens");
    }
}
