//! MQTT host transport for light endpoints.
//!
//! Attribute reports and commands come in on per-endpoint topics; channel
//! states and cluster commands go out the same way.

mod client;
mod integration;
mod sink;
mod topics;

pub use client::{MqttClient, MqttEvent, MqttMessage};
pub use integration::MqttIntegration;
pub use sink::{MqttCommandSink, MqttStateSink, Outbound};
pub use topics::{InboundTopic, Topics};
