//! CIE 1931 xy, sRGB and color temperature conversions.

use super::{ColorError, Hsb, MAX_KELVIN, MIN_KELVIN, Xy};

/// XYZ to linear sRGB (D65).
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.2406, -1.5372, -0.4986],
    [-0.9689, 1.8758, 0.0415],
    [0.0557, -0.2040, 1.0570],
];

/// Linear sRGB to XYZ (D65).
const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

fn mul(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn gamma_encode(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

fn gamma_decode(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a chromaticity to a fully bright HSB color.
///
/// Chromaticities outside the sRGB triangle are clamped to the nearest
/// displayable color. Points outside the CIE diagram itself are an error.
pub fn xy_to_hsb(xy: Xy) -> Result<Hsb, ColorError> {
    let Xy { x, y } = xy;
    if !x.is_finite() || !y.is_finite() {
        return Err(ColorError::DomainError(format!(
            "non-finite chromaticity ({}, {})",
            x, y
        )));
    }
    if y <= 0.0 {
        return Err(ColorError::DivideByZero);
    }
    if x < 0.0 || x + y > 1.0 {
        return Err(ColorError::DomainError(format!(
            "chromaticity ({:.4}, {:.4}) lies outside the CIE diagram",
            x, y
        )));
    }

    let xyz = [x / y, 1.0, (1.0 - x - y) / y];
    let [r, g, b] = mul(&XYZ_TO_RGB, xyz).map(|c| c.max(0.0));

    let max = r.max(g).max(b);
    if max <= 0.0 {
        return Err(ColorError::DomainError(format!(
            "chromaticity ({:.4}, {:.4}) has no RGB representation",
            x, y
        )));
    }

    let [r, g, b] = [r / max, g / max, b / max].map(gamma_encode);
    Ok(Hsb::from_rgb(r, g, b).with_brightness(100.0))
}

/// Convert the hue and saturation of a color to its chromaticity.
///
/// Brightness does not affect chromaticity and is ignored.
pub fn hsb_to_xy(hsb: Hsb) -> Result<Xy, ColorError> {
    let (r, g, b) = hsb.with_brightness(100.0).to_rgb();
    let linear = [r, g, b].map(gamma_decode);
    let [big_x, big_y, big_z] = mul(&RGB_TO_XYZ, linear);

    let sum = big_x + big_y + big_z;
    if sum <= f64::EPSILON {
        return Err(ColorError::DivideByZero);
    }

    Ok(Xy::new(big_x / sum, big_y / sum))
}

/// Mireds (10^6 / K) to Kelvin.
pub fn mireds_to_kelvin(mireds: f64) -> Result<f64, ColorError> {
    reciprocal_megakelvin(mireds)
}

/// Kelvin to mireds (10^6 / K).
pub fn kelvin_to_mireds(kelvin: f64) -> Result<f64, ColorError> {
    reciprocal_megakelvin(kelvin)
}

fn reciprocal_megakelvin(value: f64) -> Result<f64, ColorError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ColorError::DomainError(format!(
            "{} is not a color temperature",
            value
        )));
    }
    if value == 0.0 {
        return Err(ColorError::DivideByZero);
    }
    Ok(1_000_000.0 / value)
}

/// Chromaticity of a black body at the given temperature.
///
/// Cubic spline approximation of the Planckian locus from Kang et al.,
/// "Design of Advanced Color Temperature Control System for HDTV
/// Applications" (2002). Only defined between 1667 K and 25000 K.
pub fn kelvin_to_xy(kelvin: f64) -> Result<Xy, ColorError> {
    if !kelvin.is_finite() || !(MIN_KELVIN..=MAX_KELVIN).contains(&kelvin) {
        return Err(ColorError::DomainError(format!(
            "{:.0} K outside {}..{} K",
            kelvin, MIN_KELVIN, MAX_KELVIN
        )));
    }

    let t = kelvin;
    let t2 = t * t;
    let t3 = t2 * t;
    let x = if t < 4000.0 {
        -0.2661239e9 / t3 - 0.2343589e6 / t2 + 0.8776956e3 / t + 0.179910
    } else {
        -3.0258469e9 / t3 + 2.1070379e6 / t2 + 0.2226347e3 / t + 0.240390
    };

    let x2 = x * x;
    let x3 = x2 * x;
    let y = if t < 2222.0 {
        -1.1063814 * x3 - 1.34811020 * x2 + 2.18555832 * x - 0.20219683
    } else if t < 4000.0 {
        -0.9549476 * x3 - 1.37418593 * x2 + 2.09137015 * x - 0.16748867
    } else {
        3.0817580 * x3 - 5.8733867 * x2 + 3.75112997 * x - 0.37001483
    };

    Ok(Xy::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hue_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).abs() % 360.0;
        d.min(360.0 - d)
    }

    #[test]
    fn test_white_point_is_unsaturated() {
        let hsb = xy_to_hsb(Xy::new(0.3127, 0.3290)).unwrap();
        assert!(hsb.saturation < 1.0, "saturation {}", hsb.saturation);
        assert_eq!(hsb.brightness, 100.0);
    }

    #[test]
    fn test_primaries_round_trip() {
        for (hue, expected) in [(0.0, (0.64, 0.33)), (120.0, (0.30, 0.60)), (240.0, (0.15, 0.06))] {
            let xy = hsb_to_xy(Hsb::new(hue, 100.0, 100.0)).unwrap();
            assert!((xy.x - expected.0).abs() < 0.01, "x for hue {}: {}", hue, xy.x);
            assert!((xy.y - expected.1).abs() < 0.01, "y for hue {}: {}", hue, xy.y);

            let back = xy_to_hsb(xy).unwrap();
            assert!(hue_distance(back.hue, hue) < 1.0, "hue {} -> {}", hue, back.hue);
            assert!(back.saturation > 99.0);
        }
    }

    #[test]
    fn test_xy_domain_errors() {
        assert_eq!(xy_to_hsb(Xy::new(0.3, 0.0)), Err(ColorError::DivideByZero));
        assert!(matches!(
            xy_to_hsb(Xy::new(0.8, 0.5)),
            Err(ColorError::DomainError(_))
        ));
        assert!(matches!(
            xy_to_hsb(Xy::new(f64::NAN, 0.3)),
            Err(ColorError::DomainError(_))
        ));
    }

    #[test]
    fn test_outside_srgb_is_clamped() {
        // Saturated spectral green lies outside sRGB but inside the diagram.
        let hsb = xy_to_hsb(Xy::new(0.17, 0.70)).unwrap();
        assert!(hsb.hue > 90.0 && hsb.hue < 150.0, "hue {}", hsb.hue);
    }

    #[test]
    fn test_mireds_kelvin() {
        let kelvin = mireds_to_kelvin(154.0).unwrap();
        assert!((kelvin - 6493.5).abs() < 0.1);
        assert_eq!(kelvin_to_mireds(2000.0).unwrap(), 500.0);
        assert_eq!(mireds_to_kelvin(0.0), Err(ColorError::DivideByZero));
        assert!(kelvin_to_mireds(-1.0).is_err());
    }

    #[test]
    fn test_kelvin_to_xy_near_d65() {
        let xy = kelvin_to_xy(6500.0).unwrap();
        assert!((xy.x - 0.3135).abs() < 0.002, "x {}", xy.x);
        assert!((xy.y - 0.3237).abs() < 0.002, "y {}", xy.y);

        let warm = kelvin_to_xy(2700.0).unwrap();
        assert!(warm.x > 0.45);
    }

    #[test]
    fn test_kelvin_to_xy_domain() {
        assert!(kelvin_to_xy(1000.0).is_err());
        assert!(kelvin_to_xy(30000.0).is_err());
    }

    #[test]
    fn test_color_temperature_to_hsb() {
        let kelvin = mireds_to_kelvin(154.0).unwrap();
        let hsb = xy_to_hsb(kelvin_to_xy(kelvin).unwrap()).unwrap();
        assert!(hsb.saturation < 10.0, "6493 K should be nearly white");
    }
}
