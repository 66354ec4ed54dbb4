use crate::light::ChannelId;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Color conversion failed: {0}")]
    ColorConversion(#[from] crate::color::ColorError),

    #[error("Command {command} is not supported on channel {channel}")]
    UnsupportedCommand { channel: ChannelId, command: String },

    #[error("Invalid command payload: {0}")]
    InvalidCommand(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Light endpoint {0} is not running")]
    EndpointClosed(String),

    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
