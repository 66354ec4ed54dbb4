use super::{ColorError, format_decimal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hue (degrees), saturation (percent) and brightness (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
}

impl Hsb {
    /// Create a color, wrapping hue into `[0, 360)` and clamping the percentages.
    pub fn new(hue: f64, saturation: f64, brightness: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 100.0),
            brightness: brightness.clamp(0.0, 100.0),
        }
    }

    /// Same hue and saturation at another brightness.
    pub fn with_brightness(&self, brightness: f64) -> Self {
        Self::new(self.hue, self.saturation, brightness)
    }

    /// Convert to RGB components in `0.0..=1.0` (gamma encoded).
    pub(crate) fn to_rgb(self) -> (f64, f64, f64) {
        let s = self.saturation / 100.0;
        let v = self.brightness / 100.0;
        let h = self.hue / 60.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match sector as u8 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    }

    /// Build from RGB components in `0.0..=1.0` (gamma encoded).
    pub(crate) fn from_rgb(r: f64, g: f64, b: f64) -> Self {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta <= f64::EPSILON {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max <= 0.0 { 0.0 } else { delta / max * 100.0 };

        Self::new(hue, saturation, max * 100.0)
    }
}

impl fmt::Display for Hsb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            format_decimal(self.hue),
            format_decimal(self.saturation),
            format_decimal(self.brightness)
        )
    }
}

impl FromStr for Hsb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [h, sat, b] = parts.as_slice() else {
            return Err(ColorError::Parse(format!(
                "expected 'hue,saturation,brightness', got '{}'",
                s
            )));
        };

        let parse = |text: &str| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ColorError::Parse(format!("'{}' is not a number", text)))
        };
        let (hue, saturation, brightness) = (parse(h)?, parse(sat)?, parse(b)?);

        if !(0.0..=360.0).contains(&hue)
            || !(0.0..=100.0).contains(&saturation)
            || !(0.0..=100.0).contains(&brightness)
        {
            return Err(ColorError::Parse(format!("'{}' is out of range", s)));
        }

        Ok(Self::new(hue, saturation, brightness))
    }
}

/// CIE 1931 chromaticity coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

impl Xy {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
