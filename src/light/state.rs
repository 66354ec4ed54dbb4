//! Per-light color state and the pair-completion state machine.

use super::channel::ChannelId;
use crate::color::{self, ColorError, Hsb, Xy};
use crate::config::ColorConfig;
use crate::matter::clusters::{ColorModeEnum, FeatureMap, color_control};

/// Color representation currently driving the light.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorModel {
    HueSaturation,
    Xy,
    ColorTemperature,
}

impl ColorModel {
    pub const ALL: [ColorModel; 3] = [
        ColorModel::HueSaturation,
        ColorModel::Xy,
        ColorModel::ColorTemperature,
    ];

    /// Channels bound to this representation.
    pub fn channels(&self) -> &'static [ChannelId] {
        match self {
            Self::HueSaturation => &[ChannelId::HueSaturation],
            Self::Xy => &[ChannelId::Xy],
            Self::ColorTemperature => &[ChannelId::ColorTemperature, ChannelId::ColorTemperatureAbs],
        }
    }
}

impl From<ColorModeEnum> for ColorModel {
    fn from(mode: ColorModeEnum) -> Self {
        match mode {
            ColorModeEnum::CurrentHueAndCurrentSaturation => Self::HueSaturation,
            ColorModeEnum::CurrentXAndCurrentY => Self::Xy,
            ColorModeEnum::ColorTemperatureMireds => Self::ColorTemperature,
        }
    }
}

/// Which half of a two-attribute representation was reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PairMember {
    /// Hue (or enhanced hue) / X
    First,
    /// Saturation / Y
    Second,
}

/// How much of a representation has arrived since it was last trusted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateState {
    /// Values are consistent and may be published.
    Ready,
    /// Armed after a mode switch, nothing reported yet.
    Waiting1,
    /// One member of the pair arrived, waiting for the other one.
    Waiting2 { seen: PairMember },
}

impl UpdateState {
    /// Transition for a report of one member of a pair.
    pub fn advance_pair(self, member: PairMember) -> Self {
        match self {
            Self::Ready | Self::Waiting1 => Self::Waiting2 { seen: member },
            Self::Waiting2 { seen } if seen != member => Self::Ready,
            waiting => waiting,
        }
    }

    /// Transition for a single-attribute representation.
    pub fn advance_single(self) -> Self {
        Self::Ready
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// What the representation's channels currently show.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Displayed {
    /// Nothing published yet
    Unknown,
    Value,
    Undefined,
}

/// Tracker for one color representation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Representation {
    pub update: UpdateState,
    pub displayed: Displayed,
}

impl Representation {
    fn new() -> Self {
        Self {
            update: UpdateState::Waiting1,
            displayed: Displayed::Unknown,
        }
    }
}

/// Everything one reconciler knows about its light.
#[derive(Clone, Debug)]
pub struct LightState {
    pub on_off: bool,
    /// Percent, 0..=100
    pub brightness: f64,
    pub active: ColorModel,

    /// Degrees, from currentHue or enhancedCurrentHue
    pub hue: Option<f64>,
    /// Percent
    pub saturation: Option<f64>,
    pub x: Option<u16>,
    pub y: Option<u16>,
    pub mireds: Option<u16>,

    pub min_mireds: u16,
    pub max_mireds: u16,
    pub features: FeatureMap,

    pub hue_saturation: Representation,
    pub xy: Representation,
    pub temperature: Representation,

    /// Hue and saturation of the last composite color published, brightness
    /// not included. `None` when the last computation failed.
    pub last_color: Option<Hsb>,
}

impl LightState {
    pub fn new(config: &ColorConfig) -> Self {
        Self {
            on_off: true,
            brightness: 100.0,
            active: ColorModel::HueSaturation,
            hue: None,
            saturation: None,
            x: None,
            y: None,
            mireds: None,
            min_mireds: config.min_mireds,
            max_mireds: config.max_mireds,
            features: FeatureMap::default(),
            hue_saturation: Representation::new(),
            xy: Representation::new(),
            temperature: Representation::new(),
            last_color: None,
        }
    }

    pub fn representation(&self, model: ColorModel) -> &Representation {
        match model {
            ColorModel::HueSaturation => &self.hue_saturation,
            ColorModel::Xy => &self.xy,
            ColorModel::ColorTemperature => &self.temperature,
        }
    }

    pub fn representation_mut(&mut self, model: ColorModel) -> &mut Representation {
        match model {
            ColorModel::HueSaturation => &mut self.hue_saturation,
            ColorModel::Xy => &mut self.xy,
            ColorModel::ColorTemperature => &mut self.temperature,
        }
    }

    /// Brightness actually shown: 0 while the light is off.
    pub fn effective_brightness(&self) -> f64 {
        if self.on_off { self.brightness } else { 0.0 }
    }

    /// Hue/saturation representation as a fully bright color.
    pub fn hue_saturation_color(&self) -> Result<Hsb, ColorError> {
        let hue = self.hue.ok_or_else(|| missing("hue"))?;
        let saturation = self.saturation.ok_or_else(|| missing("saturation"))?;
        Ok(Hsb::new(hue, saturation, 100.0))
    }

    /// XY representation as a fully bright color.
    pub fn xy_color(&self) -> Result<Hsb, ColorError> {
        let x = self.x.ok_or_else(|| missing("currentX"))?;
        let y = self.y.ok_or_else(|| missing("currentY"))?;
        color::xy_to_hsb(Xy::new(
            color_control::xy_to_coordinate(x),
            color_control::xy_to_coordinate(y),
        ))
    }

    /// Reported color temperature in Kelvin.
    pub fn kelvin(&self) -> Result<f64, ColorError> {
        let mireds = self.mireds.ok_or_else(|| missing("colorTemperatureMireds"))?;
        color::mireds_to_kelvin(mireds as f64)
    }

    /// Color temperature as a percentage of the physical mired range.
    pub fn temperature_percent(&self) -> Result<f64, ColorError> {
        let mireds = self.mireds.ok_or_else(|| missing("colorTemperatureMireds"))?;
        if self.max_mireds <= self.min_mireds {
            return Err(ColorError::DivideByZero);
        }
        let span = (self.max_mireds - self.min_mireds) as f64;
        let offset = mireds as f64 - self.min_mireds as f64;
        Ok((offset / span * 100.0).clamp(0.0, 100.0))
    }

    /// Color temperature as a fully bright color.
    pub fn temperature_color(&self) -> Result<Hsb, ColorError> {
        let xy = color::kelvin_to_xy(self.kelvin()?)?;
        color::xy_to_hsb(xy)
    }

    /// Mireds for a percentage of the physical range.
    pub fn percent_to_mireds(&self, percent: f64) -> u16 {
        let span = self.max_mireds.saturating_sub(self.min_mireds) as f64;
        let mireds = self.min_mireds as f64 + percent.clamp(0.0, 100.0) / 100.0 * span;
        mireds.round() as u16
    }

    /// Clamp mireds into the physical range.
    pub fn clamp_mireds(&self, mireds: f64) -> u16 {
        mireds
            .round()
            .clamp(self.min_mireds as f64, self.max_mireds.max(self.min_mireds) as f64)
            as u16
    }
}

fn missing(attribute: &str) -> ColorError {
    ColorError::DomainError(format!("{} not reported yet", attribute))
}
