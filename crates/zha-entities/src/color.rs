//! Color space conversion between RGB and CIE 1931 xy
//!
//! Zigbee color lights take their target color as xy coordinates, so RGB
//! requests are converted before the move-to-color command goes out. The
//! conversion uses the wide-gamut D65 matrices and gives a brightness
//! channel alongside the coordinates, derived from the luminance.

/// Convert an RGB color to xy coordinates and a brightness channel.
///
/// The coordinates are rounded to three decimals. Black maps to
/// `(0.0, 0.0, 0)`.
pub fn rgb_to_xy_brightness(red: u8, green: u8, blue: u8) -> (f64, f64, u8) {
    if red == 0 && green == 0 && blue == 0 {
        return (0.0, 0.0, 0);
    }

    let r = gamma_decode(f64::from(red) / 255.0);
    let g = gamma_decode(f64::from(green) / 255.0);
    let b = gamma_decode(f64::from(blue) / 255.0);

    // Wide RGB D65 conversion
    let x = r * 0.664511 + g * 0.154324 + b * 0.162028;
    let y = r * 0.283881 + g * 0.668433 + b * 0.047685;
    let z = r * 0.000088 + g * 0.072310 + b * 0.986039;

    let sum = x + y + z;
    let brightness = (y.min(1.0) * 255.0).round() as u8;

    (round3(x / sum), round3(y / sum), brightness)
}

/// Convert xy coordinates and a brightness channel back to RGB.
///
/// Out-of-gamut results are clamped at zero and normalized against the
/// largest channel.
pub fn xy_brightness_to_rgb(x: f64, y: f64, brightness: u8) -> (u8, u8, u8) {
    if brightness == 0 {
        return (0, 0, 0);
    }

    let luminance = f64::from(brightness) / 255.0;
    let y = if y == 0.0 { 1e-11 } else { y };
    let x_val = (luminance / y) * x;
    let z_val = (luminance / y) * (1.0 - x - y);

    let r = x_val * 1.656492 - luminance * 0.354851 - z_val * 0.255038;
    let g = -x_val * 0.707196 + luminance * 1.655397 + z_val * 0.036152;
    let b = x_val * 0.051713 - luminance * 0.121364 + z_val * 1.011530;

    let r = gamma_encode(r).max(0.0);
    let g = gamma_encode(g).max(0.0);
    let b = gamma_encode(b).max(0.0);

    let max = r.max(g).max(b);
    let (r, g, b) = if max > 1.0 {
        (r / max, g / max, b / max)
    } else {
        (r, g, b)
    };

    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn gamma_decode(channel: f64) -> f64 {
    if channel > 0.04045 {
        ((channel + 0.055) / 1.055).powf(2.4)
    } else {
        channel / 12.92
    }
}

fn gamma_encode(channel: f64) -> f64 {
    if channel <= 0.0031308 {
        12.92 * channel
    } else {
        1.055 * channel.powf(1.0 / 2.4) - 0.055
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_to_xy() {
        let (x, y, brightness) = rgb_to_xy_brightness(255, 0, 0);
        assert_eq!((x, y), (0.701, 0.299));
        assert_eq!(brightness, 72);
    }

    #[test]
    fn test_white_to_xy() {
        let (x, y, brightness) = rgb_to_xy_brightness(255, 255, 255);
        assert_eq!((x, y), (0.323, 0.329));
        assert_eq!(brightness, 255);
    }

    #[test]
    fn test_black_maps_to_origin() {
        assert_eq!(rgb_to_xy_brightness(0, 0, 0), (0.0, 0.0, 0));
        assert_eq!(xy_brightness_to_rgb(0.5, 0.5, 0), (0, 0, 0));
    }

    #[test]
    fn test_red_round_trip() {
        let (x, y, brightness) = rgb_to_xy_brightness(255, 0, 0);
        let (r, g, b) = xy_brightness_to_rgb(x, y, brightness);
        assert!(r >= 250, "red channel dropped to {}", r);
        assert!(g <= 5, "green channel rose to {}", g);
        assert!(b <= 5, "blue channel rose to {}", b);
    }

    #[test]
    fn test_zero_y_does_not_divide_by_zero() {
        let (r, g, b) = xy_brightness_to_rgb(0.5, 0.0, 128);
        assert!(r <= 255 && g <= 255 && b <= 255);
    }
}
