//! Topic layout: everything for an endpoint lives under `{prefix}/{endpoint}`.

use crate::light::ChannelId;

const ATTRIBUTES: &str = "attributes";
const REFRESH: &str = "refresh";
const SET: &str = "set";
const STATE: &str = "state";
const INVOKE: &str = "invoke";

/// Inbound topic kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundTopic {
    /// JSON object of attribute changes
    Attributes { endpoint: String },
    /// JSON object of the complete current state
    Refresh { endpoint: String },
    /// Command string for one channel, as named in the topic
    Set { endpoint: String, channel: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn attributes(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.prefix, endpoint, ATTRIBUTES)
    }

    pub fn refresh(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.prefix, endpoint, REFRESH)
    }

    pub fn set(&self, endpoint: &str, channel: ChannelId) -> String {
        format!("{}/{}/{}/{}", self.prefix, endpoint, SET, channel)
    }

    pub fn state(&self, endpoint: &str, channel: ChannelId) -> String {
        format!("{}/{}/{}/{}", self.prefix, endpoint, STATE, channel)
    }

    pub fn invoke(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.prefix, endpoint, INVOKE)
    }

    /// Topics to subscribe to for one endpoint.
    pub fn subscriptions(&self, endpoint: &str) -> Vec<String> {
        vec![
            self.attributes(endpoint),
            self.refresh(endpoint),
            format!("{}/{}/{}/+", self.prefix, endpoint, SET),
        ]
    }

    /// Classify an inbound topic, `None` when it is not ours.
    pub fn parse(&self, topic: &str) -> Option<InboundTopic> {
        let rest = topic.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();

        match parts.as_slice() {
            [endpoint, ATTRIBUTES] if !endpoint.is_empty() => Some(InboundTopic::Attributes {
                endpoint: endpoint.to_string(),
            }),
            [endpoint, REFRESH] if !endpoint.is_empty() => Some(InboundTopic::Refresh {
                endpoint: endpoint.to_string(),
            }),
            [endpoint, SET, channel] if !endpoint.is_empty() => Some(InboundTopic::Set {
                endpoint: endpoint.to_string(),
                channel: channel.to_string(),
            }),
            _ => None,
        }
    }
}
