//! Reconnecting bus listener
//!
//! ```text
//! Disconnected -> Connecting -> Subscribed -> (messages...) -> Disconnected
//!      ^                                                            |
//!      +-------------------- retry interval ------------------------+
//! ```
//!
//! Retries are unbounded; the listener only stops when its task is aborted.

use super::{BusHandle, BusMessage, BusTransport, Topics};
use crate::commands::CommandRouter;
use crate::error::{ButlerResult, TransportError, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Subscribed,
}

pub struct ReconnectingBusListener {
    transport: Arc<dyn BusTransport>,
    router: Arc<CommandRouter>,
    topics: Topics,
    bus: BusHandle,
    retry_interval: Duration,
    state: watch::Sender<ListenerState>,
}

impl ReconnectingBusListener {
    pub fn new(
        transport: Arc<dyn BusTransport>,
        router: Arc<CommandRouter>,
        topics: Topics,
        bus: BusHandle,
        retry_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ListenerState::Disconnected);
        Self {
            transport,
            router,
            topics,
            bus,
            retry_interval,
            state,
        }
    }

    /// Observe state transitions
    pub fn state(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Listen forever, reconnecting after every transport failure
    pub async fn run(self) -> ButlerResult<()> {
        let mut backoff = FixedInterval::new(self.retry_interval);
        loop {
            self.transition(ListenerState::Connecting);
            if let Err(e) = self.session().await {
                warn!("📡 Bus connection lost: {}", e);
            }
            self.bus.detach();
            self.transition(ListenerState::Disconnected);

            let delay = backoff.next().unwrap_or(self.retry_interval);
            info!("📡 Reconnecting in {:?}...", delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection lifetime; only returns on a transport error
    async fn session(&self) -> Result<(), TransportError> {
        let mut connection = self.transport.connect().await?;
        connection.subscribe(&self.topics.wildcard()).await?;
        self.bus.attach(connection.publisher());
        self.transition(ListenerState::Subscribed);
        info!("📡 Subscribed to {}", self.topics.wildcard());

        loop {
            let message = connection.next_message().await?;
            self.dispatch(message).await;
        }
    }

    async fn dispatch(&self, message: BusMessage) {
        let BusMessage { topic, payload } = message;
        let Some(suffix) = self.topics.suffix(&topic) else {
            debug!("Ignoring message outside prefix: {}", topic);
            return;
        };

        match String::from_utf8(payload) {
            Ok(payload) => {
                info!("📨 Message received; topic: {}, payload: {}", topic, payload);
                self.router.handle(suffix, &payload).await;
            }
            Err(e) => warn!("⚠️ Dropping message on {}: {}", topic, ValidationError::from(e)),
        }
    }

    fn transition(&self, next: ListenerState) {
        debug!("Bus listener -> {:?}", next);
        self.state.send_replace(next);
    }
}
