//! Mock Bus for Testing
//!
//! An in-memory broker: tests deliver messages to the live connection, cut
//! it to simulate transport failures, and inspect what was published.

use async_trait::async_trait;
use butler::bus::{BusConnection, BusMessage, BusPublisher, BusTransport};
use butler::error::TransportError;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;

type Feed = mpsc::UnboundedSender<Result<BusMessage, TransportError>>;

#[derive(Default)]
struct BrokerState {
    live: Option<Feed>,
    refuse: usize,
    connects: Vec<Instant>,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct MockBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connection attempts
    pub fn refuse_next(&self, n: usize) {
        self.state.lock().unwrap().refuse = n;
    }

    /// Deliver a message to the live connection; false if there is none
    pub fn deliver(&self, topic: &str, payload: impl Into<Vec<u8>>) -> bool {
        let state = self.state.lock().unwrap();
        match &state.live {
            Some(feed) => feed
                .send(Ok(BusMessage {
                    topic: topic.to_string(),
                    payload: payload.into(),
                }))
                .is_ok(),
            None => false,
        }
    }

    /// Break the live connection with a transport error
    pub fn sever(&self) {
        if let Some(feed) = self.state.lock().unwrap().live.take() {
            let _ = feed.send(Err(TransportError::Connection("connection reset".into())));
        }
    }

    /// When each connection attempt happened
    pub fn connects(&self) -> Vec<Instant> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().published.clone()
    }
}

#[async_trait]
impl BusTransport for MockBroker {
    async fn connect(&self) -> Result<Box<dyn BusConnection>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.connects.push(Instant::now());
        if state.refuse > 0 {
            state.refuse -= 1;
            return Err(TransportError::Connection("connection refused".into()));
        }
        let (feed, messages) = mpsc::unbounded_channel();
        state.live = Some(feed);
        Ok(Box::new(MockConnection {
            messages,
            broker: self.clone(),
        }))
    }
}

struct MockConnection {
    messages: mpsc::UnboundedReceiver<Result<BusMessage, TransportError>>,
    broker: MockBroker,
}

#[async_trait]
impl BusConnection for MockConnection {
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.broker
            .state
            .lock()
            .unwrap()
            .subscriptions
            .push(filter.to_string());
        Ok(())
    }

    async fn next_message(&mut self) -> Result<BusMessage, TransportError> {
        match self.messages.recv().await {
            Some(result) => result,
            None => Err(TransportError::Connection("closed".into())),
        }
    }

    fn publisher(&self) -> Arc<dyn BusPublisher> {
        Arc::new(MockPublisher {
            broker: self.broker.clone(),
        })
    }
}

struct MockPublisher {
    broker: MockBroker,
}

#[async_trait]
impl BusPublisher for MockPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.broker
            .state
            .lock()
            .unwrap()
            .published
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}
