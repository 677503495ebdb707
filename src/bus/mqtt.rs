//! MQTT transport over rumqttc
//!
//! Each connection owns a driver task that polls the rumqttc event loop for
//! as long as the connection lives. Queued requests and keep-alives keep
//! flowing while a handler is busy; inbound publishes wait in a channel
//! until the listener asks for them.

use super::{BusConnection, BusMessage, BusPublisher, BusTransport};
use crate::config::Config;
use crate::error::TransportError;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubAck, SubscribeReasonCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Capacity of the client request queue
const REQUEST_CAPACITY: usize = 16;

type Inbound = Result<BusMessage, TransportError>;

#[derive(Debug, Clone)]
pub struct MqttTransport {
    host: String,
    port: u16,
    client_id: String,
}

impl MqttTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl BusTransport for MqttTransport {
    async fn connect(&self) -> Result<Box<dyn BusConnection>, TransportError> {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        // rumqttc connects lazily; drive the loop until the broker accepts us
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("📡 Connected to {}:{} ({:?})", self.host, self.port, ack.code);
                    break;
                }
                Ok(other) => debug!("MQTT event before ConnAck: {:?}", other),
                Err(e) => return Err(TransportError::Connection(e.to_string())),
            }
        }

        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (acks_tx, acks) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(eventloop, inbound_tx, acks_tx));

        Ok(Box::new(MqttConnection {
            client,
            inbound,
            acks,
            driver,
        }))
    }
}

/// Poll `eventloop` until it fails, forwarding publishes and subscription acks.
/// The failure is delivered as the last inbound item.
async fn drive(
    mut eventloop: EventLoop,
    inbound: mpsc::UnboundedSender<Inbound>,
    acks: mpsc::UnboundedSender<SubAck>,
) {
    let failure = loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = BusMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                if inbound.send(Ok(message)).is_err() {
                    return;
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                let _ = acks.send(ack);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                break TransportError::Connection("broker disconnected".into());
            }
            Ok(event) => trace!("MQTT event: {:?}", event),
            Err(e) => break TransportError::Connection(e.to_string()),
        }
    };
    debug!("MQTT event loop stopped: {}", failure);
    let _ = inbound.send(Err(failure));
}

struct MqttConnection {
    client: AsyncClient,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    acks: mpsc::UnboundedReceiver<SubAck>,
    driver: JoinHandle<()>,
}

impl Drop for MqttConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[async_trait]
impl BusConnection for MqttConnection {
    /// Returns once the broker has acknowledged the subscription.
    async fn subscribe(&mut self, filter: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(filter, QoS::AtMostOnce)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        // `&mut self` keeps subscriptions sequential, so the next ack is ours
        let ack = self.acks.recv().await.ok_or_else(|| {
            TransportError::Connection(format!("connection lost before {filter} was acknowledged"))
        })?;
        if ack.return_codes.contains(&SubscribeReasonCode::Failure) {
            return Err(TransportError::Request(format!(
                "broker rejected subscription to {filter}"
            )));
        }
        debug!("Subscription to {} acknowledged (pkid {})", filter, ack.pkid);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<BusMessage, TransportError> {
        self.inbound
            .recv()
            .await
            .unwrap_or_else(|| Err(TransportError::Connection("event loop stopped".into())))
    }

    fn publisher(&self) -> Arc<dyn BusPublisher> {
        Arc::new(MqttPublisher {
            client: self.client.clone(),
        })
    }
}

struct MqttPublisher {
    client: AsyncClient,
}

#[async_trait]
impl BusPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        // A full request queue drops the status message instead of stalling the caller
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}
