// ── Color math ──
//
// Conversions between the color spaces users think in (hex, RGB, HSV,
// percent) and what the bridge accepts (CIE xy, 0–254 brightness).

use crate::error::CoreError;

/// D65 white point, used when a color has no luminance at all.
pub const WHITE_POINT: (f64, f64) = (0.3127, 0.3290);

/// Warm white used to settle rooms after an effect.
pub const WARM_WHITE: (f64, f64) = (0.4573, 0.4100);

/// Convert sRGB components (each `0.0..=1.0`) to CIE xy.
///
/// Applies the sRGB gamma expansion, then the wide-gamut RGB→XYZ matrix
/// the bridge vendor publishes for its lamps.
pub fn rgb_to_xy(red: f64, green: f64, blue: f64) -> (f64, f64) {
    let r = gamma_expand(red.clamp(0.0, 1.0));
    let g = gamma_expand(green.clamp(0.0, 1.0));
    let b = gamma_expand(blue.clamp(0.0, 1.0));

    let x = r * 0.664_511 + g * 0.154_324 + b * 0.162_028;
    let y = r * 0.283_881 + g * 0.668_433 + b * 0.047_685;
    let z = r * 0.000_088 + g * 0.072_310 + b * 0.986_039;

    let sum = x + y + z;
    if sum <= f64::EPSILON {
        return WHITE_POINT;
    }
    ((x / sum).clamp(0.0, 1.0), (y / sum).clamp(0.0, 1.0))
}

fn gamma_expand(c: f64) -> f64 {
    if c > 0.040_45 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

/// HSV (each `0.0..=1.0`, hue wrapping) to RGB.
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (f64, f64, f64) {
    let s = saturation.clamp(0.0, 1.0);
    let v = value.clamp(0.0, 1.0);
    if s <= 0.0 {
        return (v, v, v);
    }

    let h = hue.rem_euclid(1.0) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    // `sector` is in 0.0..6.0 after rem_euclid.
    match sector {
        n if n < 1.0 => (v, t, p),
        n if n < 2.0 => (q, v, p),
        n if n < 3.0 => (p, v, t),
        n if n < 4.0 => (p, q, v),
        n if n < 5.0 => (t, p, v),
        _ => (v, p, q),
    }
}

pub fn hsv_to_xy(hue: f64, saturation: f64, value: f64) -> (f64, f64) {
    let (r, g, b) = hsv_to_rgb(hue, saturation, value);
    rgb_to_xy(r, g, b)
}

/// Parse `#rrggbb` or `rrggbb`.
pub fn parse_hex(input: &str) -> Result<(u8, u8, u8), CoreError> {
    let hex = input.trim().trim_start_matches('#');
    let invalid = || CoreError::Validation {
        message: format!("{input:?} is not a #rrggbb color"),
    };
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(invalid)
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Parse a hex color straight to xy.
pub fn hex_to_xy(input: &str) -> Result<(f64, f64), CoreError> {
    let (r, g, b) = parse_hex(input)?;
    Ok(rgb_to_xy(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
    ))
}

/// 0–100 % to the bridge's 0–254 scale, rounded.
pub fn percent_to_brightness(percent: u8) -> u8 {
    let scaled = (u16::from(percent.min(100)) * 254 + 50) / 100;
    u8::try_from(scaled).unwrap_or(254)
}

/// 0–254 to 0–100 %, rounded.
pub fn brightness_to_percent(brightness: u8) -> u8 {
    let scaled = (u16::from(brightness.min(254)) * 100 + 127) / 254;
    u8::try_from(scaled).unwrap_or(100)
}
