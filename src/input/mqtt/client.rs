//! MQTT client wrapper for the light bridge topics.

use crate::config::MqttConfig;
use crate::error::Result;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;

/// Message received from MQTT broker.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: String,
}

/// What the event loop reports to the integration.
#[derive(Debug, Clone)]
pub enum MqttEvent {
    /// A (re)connection was acknowledged; subscriptions must be renewed.
    Connected,
    Message(MqttMessage),
}

pub struct MqttClient {
    client: AsyncClient,
    event_loop: EventLoop,
}

impl MqttClient {
    /// Create a new MQTT client from configuration.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        // Set credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 100);

        Self { client, event_loop }
    }

    /// Run the MQTT event loop and forward events to the provided channel.
    ///
    /// Runs until the receiving side is dropped. Connection errors are
    /// retried every 5 seconds.
    pub async fn run(mut self, tx: mpsc::Sender<MqttEvent>) {
        info!("[MQTT] Starting event loop");

        loop {
            let event = match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("[MQTT] Connected");
                    MqttEvent::Connected
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let payload = match String::from_utf8(publish.payload.to_vec()) {
                        Ok(s) => s,
                        Err(e) => {
                            warn!("[MQTT] Invalid UTF-8 in payload on {}: {}", publish.topic, e);
                            continue;
                        }
                    };
                    debug!("[MQTT] Received on {}: {}", publish.topic, payload);
                    MqttEvent::Message(MqttMessage {
                        topic: publish.topic,
                        payload,
                    })
                }
                Ok(_) => continue,
                Err(e) => {
                    error!("[MQTT] Connection error: {:?}", e);
                    // Wait before reconnecting
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            if tx.send(event).await.is_err() {
                debug!("[MQTT] Event channel closed, stopping event loop");
                break;
            }
        }
    }

    /// Get a clone of the async client for publishing from other tasks.
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }
}

/// Subscribe with the QoS the bridge uses for inbound topics.
pub async fn subscribe(client: &AsyncClient, topic: &str) -> Result<()> {
    info!("[MQTT] Subscribing to {}", topic);
    client.subscribe(topic, QoS::AtLeastOnce).await?;
    Ok(())
}

/// Publish a payload, optionally retained.
pub async fn publish(
    client: &AsyncClient,
    topic: &str,
    payload: &str,
    retain: bool,
) -> Result<()> {
    debug!("[MQTT] Publishing to {}: {}", topic, payload);
    client
        .publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes())
        .await?;
    Ok(())
}
