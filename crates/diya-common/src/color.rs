//! Color types.
//!
//! Particles carry an [`Hsl`] fill style picked at creation; drawing surfaces
//! work in packed [`Rgb`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Gold (`#FFD700`).
    pub const GOLD: Self = Self::from_hex(0x00FF_D700);
    /// Orange (`#FFA500`).
    pub const ORANGE: Self = Self::from_hex(0x00FF_A500);
    /// Orange red (`#FF4500`).
    pub const ORANGE_RED: Self = Self::from_hex(0x00FF_4500);
    /// Tomato (`#FF6347`).
    pub const TOMATO: Self = Self::from_hex(0x00FF_6347);
    /// Saddle brown (`#8B4513`).
    pub const SADDLE_BROWN: Self = Self::from_hex(0x008B_4513);
    /// Bronze (`#CD7F32`).
    pub const BRONZE: Self = Self::from_hex(0x00CD_7F32);
    /// Sandy brown (`#F4A460`).
    pub const SANDY_BROWN: Self = Self::from_hex(0x00F4_A460);
    /// Pink (`#F472B6`).
    pub const PINK: Self = Self::from_hex(0x00F4_72B6);
    /// Deep indigo night sky (`#312E81`).
    pub const INDIGO: Self = Self::from_hex(0x0031_2E81);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a color from channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Creates a color from a `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// Linear blend toward `other` by `t` (0.0 = self, 1.0 = other).
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Hue/saturation/lightness color.
///
/// Hue is in degrees, saturation and lightness in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees.
    pub hue: f32,
    /// Saturation (0.0-1.0).
    pub saturation: f32,
    /// Lightness (0.0-1.0).
    pub lightness: f32,
}

impl Hsl {
    /// Creates a new HSL color.
    #[must_use]
    pub const fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Fully saturated, mid-lightness color for a hue (`hsl(h, 100%, 50%)`).
    #[must_use]
    pub const fn warm(hue: f32) -> Self {
        Self::new(hue, 1.0, 0.5)
    }

    /// Converts to 8-bit RGB.
    #[must_use]
    pub fn to_rgb(&self) -> Rgb {
        let s = self.saturation.clamp(0.0, 1.0);
        let l = self.lightness.clamp(0.0, 1.0);
        let h = self.hue.rem_euclid(360.0) / 60.0;

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - chroma / 2.0;

        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({:.1}, {}%, {}%)",
            self.hue,
            (self.saturation * 100.0).round(),
            (self.lightness * 100.0).round()
        )
    }
}

impl From<Hsl> for Rgb {
    fn from(hsl: Hsl) -> Self {
        hsl.to_rgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::GOLD, Rgb::new(255, 215, 0));
        assert_eq!(Rgb::SADDLE_BROWN.to_string(), "#8B4513");
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(Hsl::warm(0.0).to_rgb(), Rgb::new(255, 0, 0));
        assert_eq!(Hsl::warm(120.0).to_rgb(), Rgb::new(0, 255, 0));
        assert_eq!(Hsl::warm(240.0).to_rgb(), Rgb::new(0, 0, 255));
        assert_eq!(Hsl::warm(60.0).to_rgb(), Rgb::new(255, 255, 0));
    }

    #[test]
    fn test_warm_band_is_orange_to_yellow() {
        let orange = Hsl::warm(30.0).to_rgb();
        assert_eq!(orange.r, 255);
        assert!(orange.g > 100 && orange.g < 150);
        assert_eq!(orange.b, 0);
    }

    #[test]
    fn test_css_format() {
        assert_eq!(Hsl::warm(42.0).to_string(), "hsl(42.0, 100%, 50%)");
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(Rgb::BLACK.lerp(Rgb::WHITE, 0.0), Rgb::BLACK);
        assert_eq!(Rgb::BLACK.lerp(Rgb::WHITE, 1.0), Rgb::WHITE);
        assert_eq!(Rgb::BLACK.lerp(Rgb::WHITE, 2.0), Rgb::WHITE);
    }

    proptest! {
        #[test]
        fn prop_saturated_hue_spans_full_range(hue in 0.0f32..360.0) {
            let rgb = Hsl::warm(hue).to_rgb();
            let max = rgb.r.max(rgb.g).max(rgb.b);
            let min = rgb.r.min(rgb.g).min(rgb.b);
            prop_assert_eq!(max, 255);
            prop_assert_eq!(min, 0);
        }
    }
}
