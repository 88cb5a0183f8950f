//! Message loop shared by the request-driven services

use std::time::Duration;

use heattwin_connectors::{Connector, ConnectorResult};
use log::{debug, info};

/// How long one tick waits for an inbound message
pub const DEFAULT_POLL: Duration = Duration::from_millis(500);

/// Turns one inbound payload into at most one outbound payload
pub trait Handler {
    /// Handle a message; `None` publishes nothing
    fn handle(&mut self, payload: &[u8]) -> Option<Vec<u8>>;
}

/// A handler bound to a session, an inbound topic and an outbound topic
pub struct ServiceLoop<C: Connector, H: Handler> {
    session: C,
    handler: H,
    inbound: String,
    outbound: String,
    handled: u64,
    published: u64,
}

impl<C: Connector, H: Handler> ServiceLoop<C, H> {
    /// Subscribe `session` to `inbound`; replies go to `outbound`
    pub fn start(mut session: C, handler: H, inbound: &str, outbound: &str) -> ConnectorResult<Self> {
        session.subscribe(inbound)?;
        info!("listening on `{}`, replying on `{}`", inbound, outbound);
        Ok(Self {
            session,
            handler,
            inbound: inbound.to_string(),
            outbound: outbound.to_string(),
            handled: 0,
            published: 0,
        })
    }

    /// Serve until the session fails
    pub fn run(&mut self) -> ConnectorResult<()> {
        loop {
            self.tick(DEFAULT_POLL)?;
        }
    }

    /// Wait up to `poll` for one message and handle it
    ///
    /// Returns whether a message on the inbound topic was handled.
    pub fn tick(&mut self, poll: Duration) -> ConnectorResult<bool> {
        let Some(message) = self.session.receive(poll)? else {
            return Ok(false);
        };
        if message.topic != self.inbound {
            debug!("ignoring message on `{}`", message.topic);
            return Ok(false);
        }

        self.handled += 1;
        if let Some(reply) = self.handler.handle(&message.payload) {
            self.session.send(&self.outbound, &reply)?;
            self.published += 1;
        }
        Ok(true)
    }

    /// Inbound messages handled so far
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Replies published so far
    pub fn published(&self) -> u64 {
        self.published
    }

    /// The wrapped handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Close the session
    pub fn stop(&mut self) {
        self.session.disconnect();
    }
}
