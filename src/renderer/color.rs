//! Display colors

use serde::{Deserialize, Serialize};

/// An sRGB color with straight alpha, serialized as a CSS hex string
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0.0 (transparent) - 1.0 (opaque)
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Specular highlight painted on top of every particle
    pub const HIGHLIGHT: Color = Color::rgba(255, 255, 255, 0.6);
    /// Tether line color before falloff is applied
    pub const TETHER: Color = Color::rgb(120, 120, 120);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha (clamped to 0-1)
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            3 => {
                // #abc == #aabbcc
                let r = channel(0, 1)?;
                let g = channel(1, 1)?;
                let b = channel(2, 1)?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            _ => None,
        }
    }

    /// CSS color string for canvas fill/stroke styles
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s).ok_or_else(|| format!("not a hex color: {s:?}"))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        // Palette entries are opaque; alpha is a draw-time concern
        format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
    }
}

/// Default particle palette
pub fn default_palette() -> Vec<Color> {
    vec![
        Color::BLACK,
        Color::rgb(0x06, 0xB6, 0xD4),
        Color::rgb(0xDB, 0x27, 0x77),
        Color::rgb(0x8B, 0x5C, 0xF6),
    ]
}
