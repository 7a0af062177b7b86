//! Color conversions shared by light integrations

/// Convert hue (0-360) and saturation (0-100) to RGB at full value
pub fn color_hs_to_rgb(hue: f64, saturation: f64) -> (u8, u8, u8) {
    color_hsv_to_rgb(hue, saturation, 100.0)
}

/// Convert hue (0-360), saturation (0-100) and value (0-100) to RGB
///
/// Channels are truncated, not rounded, after scaling to 0-255.
pub fn color_hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (u8, u8, u8) {
    let (r, g, b) = hsv_to_rgb(hue / 360.0, saturation / 100.0, value / 100.0);
    (to_channel(r), to_channel(g), to_channel(b))
}

fn to_channel(fraction: f64) -> u8 {
    (fraction * 255.0).clamp(0.0, 255.0) as u8
}

/// Unit-interval HSV to unit-interval RGB
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Convert RGB to CIE xy chromaticity, rounded to three decimals
pub fn color_rgb_to_xy(red: u8, green: u8, blue: u8) -> (f64, f64) {
    let (x, y, _) = color_rgb_to_xy_brightness(red, green, blue);
    (x, y)
}

/// Convert RGB to CIE xy chromaticity plus a 0-255 brightness
///
/// Uses the wide-gamut D65 matrix after sRGB gamma expansion. Black maps to
/// `(0.0, 0.0, 0)`.
pub fn color_rgb_to_xy_brightness(red: u8, green: u8, blue: u8) -> (f64, f64, u8) {
    if red == 0 && green == 0 && blue == 0 {
        return (0.0, 0.0, 0);
    }

    let r = gamma_expand(f64::from(red) / 255.0);
    let g = gamma_expand(f64::from(green) / 255.0);
    let b = gamma_expand(f64::from(blue) / 255.0);

    let big_x = r * 0.664511 + g * 0.154324 + b * 0.162028;
    let big_y = r * 0.283881 + g * 0.668433 + b * 0.047685;
    let big_z = r * 0.000088 + g * 0.072310 + b * 0.986039;

    let sum = big_x + big_y + big_z;
    let x = big_x / sum;
    let y = big_y / sum;

    let brightness = (big_y * 255.0).round().clamp(0.0, 255.0) as u8;

    (round3(x), round3(y), brightness)
}

fn gamma_expand(channel: f64) -> f64 {
    if channel > 0.04045 {
        ((channel + 0.055) / (1.0 + 0.055)).powf(2.4)
    } else {
        channel / 12.92
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Convert mireds to Kelvin, truncating
pub fn color_temperature_mired_to_kelvin(mireds: u16) -> u32 {
    if mireds == 0 {
        return 0;
    }
    1_000_000 / u32::from(mireds)
}

/// Convert Kelvin to mireds, truncating and saturating at `u16::MAX`
pub fn color_temperature_kelvin_to_mired(kelvin: u32) -> u16 {
    if kelvin == 0 {
        return 0;
    }
    u16::try_from(1_000_000 / kelvin).unwrap_or(u16::MAX)
}
