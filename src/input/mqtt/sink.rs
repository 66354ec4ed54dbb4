//! Channel state and cluster command sinks backed by MQTT publishes.
//!
//! Sinks are called synchronously from endpoint tasks, so they only queue
//! the publish; the integration task drains the queue into the client.

use super::topics::Topics;
use crate::light::{ChannelId, ChannelState, CommandSink, StateSink};
use crate::matter::ClusterCommand;
use log::warn;
use tokio::sync::mpsc;

/// A queued publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

fn enqueue(tx: &OutboundSender, outbound: Outbound) {
    if tx.send(outbound).is_err() {
        warn!("[MQTT] Publisher stopped, dropping outbound message");
    }
}

/// Publishes channel states as retained messages.
pub struct MqttStateSink {
    endpoint: String,
    topics: Topics,
    tx: OutboundSender,
}

impl MqttStateSink {
    pub fn new(endpoint: impl Into<String>, topics: Topics, tx: OutboundSender) -> Self {
        Self {
            endpoint: endpoint.into(),
            topics,
            tx,
        }
    }
}

impl StateSink for MqttStateSink {
    fn publish(&self, channel: ChannelId, state: ChannelState) {
        enqueue(
            &self.tx,
            Outbound {
                topic: self.topics.state(&self.endpoint, channel),
                payload: state.to_string(),
                retain: true,
            },
        );
    }
}

/// Publishes cluster commands as JSON for the controller to invoke.
pub struct MqttCommandSink {
    endpoint: String,
    topics: Topics,
    tx: OutboundSender,
}

impl MqttCommandSink {
    pub fn new(endpoint: impl Into<String>, topics: Topics, tx: OutboundSender) -> Self {
        Self {
            endpoint: endpoint.into(),
            topics,
            tx,
        }
    }
}

impl CommandSink for MqttCommandSink {
    fn send(&self, command: ClusterCommand) {
        let payload = match serde_json::to_string(&command) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "[MQTT] Failed to serialize {}.{}: {}",
                    command.cluster_name, command.command_name, e
                );
                return;
            }
        };
        enqueue(
            &self.tx,
            Outbound {
                topic: self.topics.invoke(&self.endpoint),
                payload,
                retain: false,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Hsb;
    use crate::matter::clusters::color_control;

    #[test]
    fn test_state_sink_publishes_retained() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = MqttStateSink::new("desk", Topics::new("lights"), tx);
        sink.publish(ChannelId::Color, ChannelState::Hsb(Hsb::new(120.0, 50.0, 25.0)));
        sink.publish(ChannelId::Xy, ChannelState::Undefined);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.topic, "lights/desk/state/color");
        assert_eq!(first.payload, "120,50,25");
        assert!(first.retain);
        assert_eq!(rx.try_recv().unwrap().payload, "UNDEF");
    }

    #[test]
    fn test_command_sink_publishes_json() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = MqttCommandSink::new("desk", Topics::new("lights"), tx);
        sink.send(color_control::move_to_color_temperature(250, 0));

        let out = rx.try_recv().unwrap();
        assert_eq!(out.topic, "lights/desk/invoke");
        assert!(!out.retain);
        let value: serde_json::Value = serde_json::from_str(&out.payload).unwrap();
        assert_eq!(value["clusterName"], "ColorControl");
        assert_eq!(value["commandName"], "moveToColorTemperature");
        assert_eq!(value["args"]["colorTemperatureMireds"], 250);
    }

    #[test]
    fn test_closed_queue_is_not_fatal() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = MqttStateSink::new("desk", Topics::new("lights"), tx);
        sink.publish(ChannelId::Color, ChannelState::Undefined);
    }
}
