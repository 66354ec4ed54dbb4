//! Attribute change reports pushed by the controller.
//!
//! A report is the attribute name plus its JSON value, as delivered by a
//! Matter controller subscription. Typed accessors return `None` for nulls,
//! wrong types and out-of-range numbers so callers can treat those as "no
//! update".

use super::clusters::color_control::ColorControlAttribute;
use super::clusters::{level_control, on_off};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Attribute names the light bridge reacts to, across clusters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AttributeName {
    OnOff,
    CurrentLevel,
    ColorControl(ColorControlAttribute),
}

impl AttributeName {
    /// Whether this attribute selects the active color representation.
    pub fn is_color_mode(&self) -> bool {
        matches!(
            self,
            Self::ColorControl(
                ColorControlAttribute::ColorMode | ColorControlAttribute::EnhancedColorMode
            )
        )
    }
}

impl FromStr for AttributeName {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            on_off::ATTRIBUTE_ON_OFF => Ok(Self::OnOff),
            level_control::ATTRIBUTE_CURRENT_LEVEL => Ok(Self::CurrentLevel),
            other => other.parse().map(Self::ColorControl),
        }
    }
}

/// One attribute change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReport {
    pub name: String,
    pub value: Value,
}

impl AttributeReport {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Recognized attribute, or `None` for names the bridge does not know.
    pub fn attribute(&self) -> Option<AttributeName> {
        self.name.parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.value.as_u64().or_else(|| {
            self.value
                .as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }

    pub fn as_u8(&self) -> Option<u8> {
        self.as_u64().and_then(|v| u8::try_from(v).ok())
    }

    pub fn as_u16(&self) -> Option<u16> {
        self.as_u64().and_then(|v| u16::try_from(v).ok())
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}

/// Split a JSON object of `{name: value}` pairs into reports.
///
/// Color mode attributes come first so that the values sharing a message
/// with a mode switch count toward the newly active representation.
pub fn reports_from_object(object: Map<String, Value>) -> Vec<AttributeReport> {
    let (mut modes, rest): (Vec<_>, Vec<_>) = object
        .into_iter()
        .map(|(name, value)| AttributeReport::new(name, value))
        .partition(|report| report.attribute().is_some_and(|a| a.is_color_mode()));
    modes.extend(rest);
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_names_across_clusters() {
        assert_eq!(
            AttributeReport::new("onOff", true).attribute(),
            Some(AttributeName::OnOff)
        );
        assert_eq!(
            AttributeReport::new("currentLevel", 100).attribute(),
            Some(AttributeName::CurrentLevel)
        );
        assert_eq!(
            AttributeReport::new("currentSaturation", 100).attribute(),
            Some(AttributeName::ColorControl(
                ColorControlAttribute::CurrentSaturation
            ))
        );
        assert_eq!(AttributeReport::new("vendorMagic", 1).attribute(), None);
    }

    #[test]
    fn test_typed_values() {
        assert_eq!(AttributeReport::new("currentHue", 127).as_u8(), Some(127));
        assert_eq!(AttributeReport::new("currentHue", 127.0).as_u8(), Some(127));
        assert_eq!(AttributeReport::new("currentHue", 300).as_u8(), None);
        assert_eq!(AttributeReport::new("currentHue", -3).as_u8(), None);
        assert_eq!(AttributeReport::new("currentHue", 12.5).as_u8(), None);
        assert_eq!(AttributeReport::new("currentHue", Value::Null).as_u8(), None);
        assert_eq!(AttributeReport::new("currentHue", "127").as_u8(), None);
        assert_eq!(AttributeReport::new("onOff", 1).as_bool(), None);
    }

    #[test]
    fn test_reports_from_object_puts_mode_first() {
        let object = json!({
            "currentHue": 10,
            "colorMode": 0,
            "currentSaturation": 20,
        });
        let Value::Object(map) = object else {
            unreachable!()
        };
        let reports = reports_from_object(map);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].name, "colorMode");
    }
}
