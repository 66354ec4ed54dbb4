//! Channels, states and commands exchanged with the host.
//!
//! The host side is abstracted behind [`StateSink`] (where channel states
//! are published) and [`CommandSink`] (where cluster commands are sent).

use crate::color::{Hsb, format_decimal};
use crate::error::BridgeError;
use crate::matter::ClusterCommand;
use std::fmt;
use std::str::FromStr;
use strum::EnumString;

/// Externally addressable channels of a color light.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumString, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ChannelId {
    /// Composite color including brightness (0 when the light is off)
    Color,
    /// Hue/saturation representation
    HueSaturation,
    /// XY chromaticity representation
    Xy,
    /// Color temperature as a percentage of the physical mired range
    ColorTemperature,
    /// Color temperature in Kelvin
    ColorTemperatureAbs,
}

/// Value published on a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelState {
    Hsb(Hsb),
    Percent(f64),
    /// Decimal color temperature in Kelvin
    Kelvin(f64),
    /// The channel has no meaningful value right now
    Undefined,
}

impl ChannelState {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hsb(hsb) => write!(f, "{}", hsb),
            Self::Percent(p) => write!(f, "{}", format_decimal(*p)),
            Self::Kelvin(k) => write!(f, "{} K", format_decimal(*k)),
            Self::Undefined => write!(f, "UNDEF"),
        }
    }
}

/// User-issued command for a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    OnOff(bool),
    Percent(f64),
    Hsb(Hsb),
    Kelvin(f64),
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OnOff(_) => "OnOff",
            Self::Percent(_) => "Percent",
            Self::Hsb(_) => "HSB",
            Self::Kelvin(_) => "Kelvin",
        }
    }
}

impl FromStr for Command {
    type Err = BridgeError;

    /// Accepts `ON`, `OFF`, `42`, `120,100,50` and `6500 K`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || BridgeError::InvalidCommand(text.to_string());

        if text.eq_ignore_ascii_case("on") {
            return Ok(Self::OnOff(true));
        }
        if text.eq_ignore_ascii_case("off") {
            return Ok(Self::OnOff(false));
        }
        if let Some(kelvin) = text.strip_suffix('K').or_else(|| text.strip_suffix('k')) {
            let kelvin: f64 = kelvin.trim().parse().map_err(|_| invalid())?;
            return if kelvin.is_finite() && kelvin > 0.0 {
                Ok(Self::Kelvin(kelvin))
            } else {
                Err(invalid())
            };
        }
        if text.contains(',') {
            return text
                .parse::<Hsb>()
                .map(Self::Hsb)
                .map_err(|e| BridgeError::InvalidCommand(e.to_string()));
        }

        let percent: f64 = text.parse().map_err(|_| invalid())?;
        if (0.0..=100.0).contains(&percent) {
            Ok(Self::Percent(percent))
        } else {
            Err(invalid())
        }
    }
}

/// Receives channel state updates.
pub trait StateSink: Send + Sync {
    fn publish(&self, channel: ChannelId, state: ChannelState);
}

/// Receives outbound cluster commands. Fire-and-forget: transport retries
/// are the sink's business.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: ClusterCommand);
}
