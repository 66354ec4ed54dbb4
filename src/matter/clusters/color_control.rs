//! ColorControl cluster (0x0300).
//!
//! Hue and saturation are reported in 0..=254 device units, enhanced hue in
//! 0..=65535, chromaticity in 0..=65279 where 65536 would be 1.0, and color
//! temperature in mireds.

use super::{ClusterCommand, OptionsBitmap};
use strum::{EnumString, FromRepr, IntoStaticStr};

/// Cluster name used by controller command invocations
pub const CLUSTER_NAME: &str = "ColorControl";

/// Highest hue / saturation value in device units
pub const MAX_HUE: u8 = 254;
pub const MAX_SATURATION: u8 = 254;

/// Highest currentX / currentY value
pub const MAX_XY: u16 = 0xFEFF;

/// Highest colorTemperatureMireds value
pub const MAX_MIREDS: u16 = 0xFEFF;

const XY_SCALE: f64 = 65536.0;

/// Attributes of the ColorControl cluster that the bridge understands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumString, IntoStaticStr)]
pub enum ColorControlAttribute {
    #[strum(serialize = "currentHue")]
    CurrentHue,
    #[strum(serialize = "currentSaturation")]
    CurrentSaturation,
    #[strum(serialize = "remainingTime")]
    RemainingTime,
    #[strum(serialize = "currentX")]
    CurrentX,
    #[strum(serialize = "currentY")]
    CurrentY,
    #[strum(serialize = "colorTemperatureMireds")]
    ColorTemperatureMireds,
    #[strum(serialize = "colorMode")]
    ColorMode,
    #[strum(serialize = "options")]
    Options,
    #[strum(serialize = "enhancedCurrentHue")]
    EnhancedCurrentHue,
    #[strum(serialize = "enhancedColorMode")]
    EnhancedColorMode,
    #[strum(serialize = "colorLoopActive")]
    ColorLoopActive,
    #[strum(serialize = "colorCapabilities")]
    ColorCapabilities,
    #[strum(serialize = "colorTempPhysicalMinMireds")]
    ColorTempPhysicalMinMireds,
    #[strum(serialize = "colorTempPhysicalMaxMireds")]
    ColorTempPhysicalMaxMireds,
    #[strum(serialize = "startUpColorTemperatureMireds")]
    StartUpColorTemperatureMireds,
    #[strum(serialize = "featureMap")]
    FeatureMap,
}

/// ColorMode attribute values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum ColorModeEnum {
    CurrentHueAndCurrentSaturation = 0,
    CurrentXAndCurrentY = 1,
    ColorTemperatureMireds = 2,
}

/// EnhancedColorMode attribute values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum EnhancedColorModeEnum {
    CurrentHueAndCurrentSaturation = 0,
    CurrentXAndCurrentY = 1,
    ColorTemperatureMireds = 2,
    EnhancedCurrentHueAndCurrentSaturation = 3,
}

impl From<EnhancedColorModeEnum> for ColorModeEnum {
    fn from(mode: EnhancedColorModeEnum) -> Self {
        match mode {
            EnhancedColorModeEnum::CurrentHueAndCurrentSaturation
            | EnhancedColorModeEnum::EnhancedCurrentHueAndCurrentSaturation => {
                Self::CurrentHueAndCurrentSaturation
            }
            EnhancedColorModeEnum::CurrentXAndCurrentY => Self::CurrentXAndCurrentY,
            EnhancedColorModeEnum::ColorTemperatureMireds => Self::ColorTemperatureMireds,
        }
    }
}

/// FeatureMap (and ColorCapabilities) bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeatureMap {
    pub hue_saturation: bool,
    pub enhanced_hue: bool,
    pub color_loop: bool,
    pub xy: bool,
    pub color_temperature: bool,
}

impl FeatureMap {
    pub const HUE_SATURATION: u32 = 0x01;
    pub const ENHANCED_HUE: u32 = 0x02;
    pub const COLOR_LOOP: u32 = 0x04;
    pub const XY: u32 = 0x08;
    pub const COLOR_TEMPERATURE: u32 = 0x10;

    pub fn from_bits(bits: u32) -> Self {
        Self {
            hue_saturation: bits & Self::HUE_SATURATION != 0,
            enhanced_hue: bits & Self::ENHANCED_HUE != 0,
            color_loop: bits & Self::COLOR_LOOP != 0,
            xy: bits & Self::XY != 0,
            color_temperature: bits & Self::COLOR_TEMPERATURE != 0,
        }
    }
}

impl Default for FeatureMap {
    /// Assume a full extended color light until the device says otherwise.
    fn default() -> Self {
        Self::from_bits(Self::HUE_SATURATION | Self::XY | Self::COLOR_TEMPERATURE)
    }
}

/// Device hue units to degrees.
pub fn hue_to_degrees(hue: u8) -> f64 {
    (hue.min(MAX_HUE) as f64 * 360.0 / MAX_HUE as f64).rem_euclid(360.0)
}

/// Degrees to device hue units.
pub fn degrees_to_hue(degrees: f64) -> u8 {
    let degrees = degrees.rem_euclid(360.0);
    (degrees * MAX_HUE as f64 / 360.0).round().min(MAX_HUE as f64) as u8
}

/// Enhanced hue (0..=65535) to degrees.
pub fn enhanced_hue_to_degrees(hue: u16) -> f64 {
    hue as f64 * 360.0 / 65536.0
}

/// Device saturation units to percent.
pub fn saturation_to_percent(saturation: u8) -> f64 {
    saturation.min(MAX_SATURATION) as f64 * 100.0 / MAX_SATURATION as f64
}

/// Percent to device saturation units.
pub fn percent_to_saturation(percent: f64) -> u8 {
    (percent.clamp(0.0, 100.0) * MAX_SATURATION as f64 / 100.0).round() as u8
}

/// currentX / currentY to a chromaticity coordinate.
pub fn xy_to_coordinate(value: u16) -> f64 {
    value.min(MAX_XY) as f64 / XY_SCALE
}

/// Chromaticity coordinate to currentX / currentY.
pub fn coordinate_to_xy(coordinate: f64) -> u16 {
    (coordinate.clamp(0.0, 1.0) * XY_SCALE).round().min(MAX_XY as f64) as u16
}

pub fn move_to_hue_and_saturation(hue: u8, saturation: u8, transition_time: u16) -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "moveToHueAndSaturation")
        .arg("hue", hue)
        .arg("saturation", saturation)
        .arg("transitionTime", transition_time)
        .with_options(OptionsBitmap::EXECUTE_IF_OFF)
}

pub fn move_to_color(color_x: u16, color_y: u16, transition_time: u16) -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "moveToColor")
        .arg("colorX", color_x)
        .arg("colorY", color_y)
        .arg("transitionTime", transition_time)
        .with_options(OptionsBitmap::EXECUTE_IF_OFF)
}

pub fn move_to_color_temperature(mireds: u16, transition_time: u16) -> ClusterCommand {
    ClusterCommand::new(CLUSTER_NAME, "moveToColorTemperature")
        .arg("colorTemperatureMireds", mireds)
        .arg("transitionTime", transition_time)
        .with_options(OptionsBitmap::EXECUTE_IF_OFF)
}
