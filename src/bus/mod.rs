//! Message bus
//!
//! Transport-agnostic seams for the command channel, the topic layout under
//! the configured prefix, and a shared handle the button uses to publish
//! through whatever connection the listener currently holds.

use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::debug;

pub mod listener;
pub mod mqtt;

pub use listener::{ListenerState, ReconnectingBusListener};
pub use mqtt::MqttTransport;

/// A message received from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Opens fresh connections to the broker
#[async_trait]
pub trait BusTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BusConnection>, TransportError>;
}

/// One live connection. Dropped and re-created on every reconnect.
#[async_trait]
pub trait BusConnection: Send {
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError>;

    /// Wait for the next inbound message
    async fn next_message(&mut self) -> Result<BusMessage, TransportError>;

    /// Publisher bound to this connection
    fn publisher(&self) -> Arc<dyn BusPublisher>;
}

#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;
}

/// Topic names relative to the configured prefix
#[derive(Debug, Clone)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Subscription filter covering every command
    pub fn wildcard(&self) -> String {
        format!("{}/#", self.prefix)
    }

    pub fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.prefix, suffix)
    }

    /// Suffix of `topic` below the prefix, if it lives there
    pub fn suffix<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('/')
            .filter(|s| !s.is_empty())
    }
}

/// Shared slot holding the publisher of the current connection, if any
#[derive(Clone, Default)]
pub struct BusHandle {
    current: Arc<RwLock<Option<Arc<dyn BusPublisher>>>>,
}

impl std::fmt::Debug for BusHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusHandle")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl BusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, publisher: Arc<dyn BusPublisher>) {
        if let Ok(mut current) = self.current.write() {
            *current = Some(publisher);
        }
    }

    pub(crate) fn detach(&self) {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.current.read().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Publish through the current connection
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        let publisher = self
            .current
            .read()
            .ok()
            .and_then(|c| c.clone())
            .ok_or(TransportError::NotConnected)?;
        debug!("Publishing to {}: {}", topic, payload);
        publisher.publish(topic, payload).await
    }
}
