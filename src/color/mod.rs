//! Color-space types and conversions used by the light reconciler.
//!
//! Everything in here is pure math: HSB and CIE 1931 xy values plus the
//! conversions between them, mireds and Kelvin. Conversions that can hit a
//! math domain error return [`ColorError`] instead of producing NaN.

mod cie;
mod hsb;

pub use cie::{hsb_to_xy, kelvin_to_mireds, kelvin_to_xy, mireds_to_kelvin, xy_to_hsb};
pub use hsb::{Hsb, Xy};

use thiserror::Error;

/// Lowest color temperature the Planckian locus approximation covers.
pub const MIN_KELVIN: f64 = 1667.0;
/// Highest color temperature the Planckian locus approximation covers.
pub const MAX_KELVIN: f64 = 25000.0;

/// Failure of a color-space conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    /// Input lies outside the domain of the conversion.
    #[error("value outside conversion domain: {0}")]
    DomainError(String),

    /// Conversion would divide by zero.
    #[error("division by zero")]
    DivideByZero,

    /// Text could not be parsed as a color.
    #[error("cannot parse color: {0}")]
    Parse(String),
}

/// Render a decimal the way openHAB state strings look: at most two
/// fraction digits, trailing zeros dropped.
pub fn format_decimal(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
