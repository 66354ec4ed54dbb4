//! MQTT integration orchestrator for light endpoints.
//!
//! Keeps MQTT internals out of main.rs: the integration owns the client,
//! renews subscriptions on every (re)connect, routes inbound messages to
//! the endpoint tasks and drains the outbound queue the sinks write to.

use super::client::{self, MqttClient, MqttEvent, MqttMessage};
use super::sink::{MqttCommandSink, MqttStateSink, Outbound, OutboundSender};
use super::topics::{InboundTopic, Topics};
use crate::config::MqttConfig;
use crate::error::{BridgeError, Result};
use crate::light::{ChannelId, Command, EndpointEvent, EndpointSender};
use crate::matter::attributes::reports_from_object;
use crate::matter::AttributeReport;
use log::{debug, info, warn};
use rumqttc::AsyncClient;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct MqttIntegration {
    config: MqttConfig,
    topics: Topics,
    lights: HashMap<String, EndpointSender>,
    outbound_tx: OutboundSender,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl MqttIntegration {
    /// Create a new MQTT integration with the given broker config.
    pub fn new(config: MqttConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            topics: Topics::new(config.topic_prefix.clone()),
            config,
            lights: HashMap::new(),
            outbound_tx,
            outbound_rx,
        }
    }

    /// Sink for an endpoint's channel states.
    pub fn state_sink(&self, endpoint: &str) -> MqttStateSink {
        MqttStateSink::new(endpoint, self.topics.clone(), self.outbound_tx.clone())
    }

    /// Sink for an endpoint's outbound cluster commands.
    pub fn command_sink(&self, endpoint: &str) -> MqttCommandSink {
        MqttCommandSink::new(endpoint, self.topics.clone(), self.outbound_tx.clone())
    }

    /// Route an endpoint's topics to its task.
    pub fn with_light(mut self, sender: EndpointSender) -> Self {
        self.lights.insert(sender.name().to_string(), sender);
        self
    }

    /// Start the integration.
    ///
    /// Spawns a background task that runs until `shutdown` is cancelled.
    pub fn start(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    async fn run(self, shutdown: CancellationToken) {
        let Self {
            config,
            topics,
            lights,
            outbound_tx,
            outbound_rx,
        } = self;
        // Sinks hold their own senders; ours would keep the queue open forever.
        drop(outbound_tx);

        if lights.is_empty() {
            info!("[MQTT] No lights configured, skipping MQTT integration");
            return;
        }

        info!(
            "[MQTT] Connecting to {}:{}",
            config.broker_host, config.broker_port
        );

        let mqtt_client = MqttClient::new(&config);
        let client = mqtt_client.client();
        let (event_tx, mut event_rx) = mpsc::channel::<MqttEvent>(64);
        let mqtt_loop = tokio::spawn(mqtt_client.run(event_tx));

        info!(
            "[MQTT] Integration started with {} light(s) under {}",
            lights.len(),
            config.topic_prefix
        );

        // Publishing and subscribing wait on the client's request queue, which
        // only drains while the event loop is free to deliver into `event_rx`.
        // Neither may block the loop below.
        let publisher = spawn_publisher(client.clone(), outbound_rx);
        let endpoints: Vec<String> = lights.keys().cloned().collect();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = event_rx.recv() => match event {
                    Some(MqttEvent::Connected) => {
                        tokio::spawn(subscribe_all(client.clone(), topics.clone(), endpoints.clone()));
                    }
                    Some(MqttEvent::Message(msg)) => {
                        if let Err(e) = route(&topics, &lights, &msg).await {
                            warn!("[MQTT] Dropping message on {}: {}", msg.topic, e);
                        }
                    }
                    None => break,
                },
            }
        }

        if let Err(e) = client.try_disconnect() {
            debug!("[MQTT] Disconnect failed: {:?}", e);
        }
        publisher.abort();
        mqtt_loop.abort();
        info!("[MQTT] Integration stopped");
    }
}

/// Drain the outbound queue into the client on its own task.
fn spawn_publisher(
    client: AsyncClient,
    mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(out) = outbound_rx.recv().await {
            if let Err(e) = client::publish(&client, &out.topic, &out.payload, out.retain).await {
                warn!("[MQTT] Failed to publish to {}: {}", out.topic, e);
            }
        }
        debug!("[MQTT] Outbound queue closed");
    })
}

async fn subscribe_all(client: AsyncClient, topics: Topics, endpoints: Vec<String>) {
    for endpoint in &endpoints {
        for topic in topics.subscriptions(endpoint) {
            if let Err(e) = client::subscribe(&client, &topic).await {
                warn!("[MQTT] Failed to subscribe to {}: {}", topic, e);
            }
        }
    }
}

async fn route(
    topics: &Topics,
    lights: &HashMap<String, EndpointSender>,
    msg: &MqttMessage,
) -> Result<()> {
    let Some((endpoint, event)) = decode(topics, msg)? else {
        debug!("[MQTT] Ignoring message on {}", msg.topic);
        return Ok(());
    };
    let Some(light) = lights.get(&endpoint) else {
        debug!("[MQTT] No light named {}", endpoint);
        return Ok(());
    };

    match event {
        Decoded::Attributes(reports) => {
            for report in reports {
                light.send_attribute(report).await?;
            }
            Ok(())
        }
        Decoded::Event(event) => light.send(event).await,
    }
}

/// Inbound message translated for an endpoint.
#[derive(Debug)]
enum Decoded {
    /// Attribute changes, applied one at a time in order
    Attributes(Vec<AttributeReport>),
    Event(EndpointEvent),
}

fn decode(topics: &Topics, msg: &MqttMessage) -> Result<Option<(String, Decoded)>> {
    let Some(topic) = topics.parse(&msg.topic) else {
        return Ok(None);
    };

    let decoded = match topic {
        InboundTopic::Attributes { endpoint } => (
            endpoint,
            Decoded::Attributes(reports_from_object(parse_object(&msg.payload)?)),
        ),
        InboundTopic::Refresh { endpoint } => (
            endpoint,
            Decoded::Event(EndpointEvent::Refresh(reports_from_object(parse_object(
                &msg.payload,
            )?))),
        ),
        InboundTopic::Set { endpoint, channel } => {
            let channel: ChannelId = channel
                .parse()
                .map_err(|_| BridgeError::UnknownChannel(channel.clone()))?;
            let command: Command = msg.payload.parse()?;
            (endpoint, Decoded::Event(EndpointEvent::Command { channel, command }))
        }
    };

    Ok(Some(decoded))
}

fn parse_object(payload: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::InvalidCommand(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Hsb;

    fn msg(topic: &str, payload: &str) -> MqttMessage {
        MqttMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_decode_attributes_puts_mode_first() {
        let topics = Topics::new("lights");
        let decoded = decode(
            &topics,
            &msg(
                "lights/desk/attributes",
                r#"{"currentX": 20000, "enhancedColorMode": 1, "currentY": 21000}"#,
            ),
        )
        .unwrap();

        match decoded {
            Some((endpoint, Decoded::Attributes(reports))) => {
                assert_eq!(endpoint, "desk");
                assert_eq!(reports.len(), 3);
                assert_eq!(reports[0].name, "enhancedColorMode");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_command() {
        let topics = Topics::new("lights");
        let decoded = decode(&topics, &msg("lights/desk/set/color", "120,100,40")).unwrap();
        match decoded {
            Some((_, Decoded::Event(EndpointEvent::Command { channel, command }))) => {
                assert_eq!(channel, ChannelId::Color);
                assert_eq!(command, Command::Hsb(Hsb::new(120.0, 100.0, 40.0)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_refresh() {
        let topics = Topics::new("lights");
        let decoded = decode(
            &topics,
            &msg("lights/desk/refresh", r#"{"onOff": true, "colorMode": 2}"#),
        )
        .unwrap();
        assert!(matches!(
            decoded,
            Some((_, Decoded::Event(EndpointEvent::Refresh(ref reports)))) if reports.len() == 2
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_client_queue_does_not_block_inbound() {
        use crate::config::Config;
        use crate::input::simulation::LogSink;
        use crate::light::{ChannelState, ColorReconciler, LightEndpointHandle};
        use rumqttc::MqttOptions;
        use std::sync::Arc;
        use std::time::Duration;

        // Nobody polls the event loop, so the request queue never drains
        let (client, _event_loop) =
            AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 1);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let publisher = spawn_publisher(client, outbound_rx);
        for i in 0..10 {
            outbound_tx
                .send(Outbound {
                    topic: format!("lights/desk/state/{}", i),
                    payload: "UNDEF".to_string(),
                    retain: true,
                })
                .unwrap();
        }
        tokio::task::yield_now().await;
        assert!(!publisher.is_finished());

        let sink = Arc::new(LogSink::new("desk"));
        let reconciler =
            ColorReconciler::new("desk", &Config::default().color, sink.clone(), sink.clone());
        let token = CancellationToken::new();
        let handle = LightEndpointHandle::spawn(reconciler, token.clone());
        let lights = HashMap::from([("desk".to_string(), handle.sender())]);

        let topics = Topics::new("lights");
        let routed = tokio::time::timeout(
            Duration::from_secs(1),
            route(
                &topics,
                &lights,
                &msg(
                    "lights/desk/attributes",
                    r#"{"currentHue": 127, "currentSaturation": 254}"#,
                ),
            ),
        )
        .await;
        assert!(matches!(routed, Ok(Ok(()))));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            sink.last(ChannelId::Color),
            Some(ChannelState::Hsb(_))
        ));

        publisher.abort();
        token.cancel();
        handle.join().await;
    }

    #[test]
    fn test_decode_errors() {
        let topics = Topics::new("lights");
        assert!(matches!(
            decode(&topics, &msg("lights/desk/set/brightness", "50")),
            Err(BridgeError::UnknownChannel(_))
        ));
        assert!(matches!(
            decode(&topics, &msg("lights/desk/set/color", "purple")),
            Err(BridgeError::InvalidCommand(_))
        ));
        assert!(matches!(
            decode(&topics, &msg("lights/desk/attributes", "[1, 2]")),
            Err(BridgeError::InvalidCommand(_))
        ));
        assert!(matches!(
            decode(&topics, &msg("lights/desk/attributes", "{nope")),
            Err(BridgeError::SerdeJsonError(_))
        ));
        assert!(decode(&topics, &msg("other/desk/attributes", "{}"))
            .unwrap()
            .is_none());
    }
}
