use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{FrameError, Result};

/// An RGB color for the beak LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Color names accepted by [`Color::from_str`].
pub const NAMED_COLORS: [(&str, Color); 11] = [
    ("red", Color::rgb(255, 0, 0)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("green", Color::rgb(0, 255, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("blue", Color::rgb(0, 0, 255)),
    ("grey", Color::rgb(128, 128, 128)),
    ("white", Color::rgb(255, 255, 255)),
    ("black", Color::rgb(0, 0, 0)),
    ("pink", Color::rgb(255, 192, 203)),
    ("orange", Color::rgb(255, 165, 0)),
    ("brown", Color::rgb(165, 42, 42)),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Look up a color by name.
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, color)| *color)
    }

    /// Parse a `#RRGGBB` hex triplet.
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6 && digits.is_ascii())
            .ok_or_else(|| FrameError::invalid(format!("'{input}' is not a #RRGGBB color")))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| FrameError::invalid(format!("'{input}' has non-hex digits")))
        };

        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// The three payload bytes of an LED command.
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Color {
    type Err = FrameError;

    /// Accepts a color name or a `#RRGGBB` hex triplet.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(color) = Self::named(s) {
            return Ok(color);
        }
        if s.starts_with('#') {
            return Self::from_hex(s);
        }
        Err(FrameError::invalid(format!(
            "'{s}' is not a color (use a name, #RRGGBB, or three 0-255 values)"
        )))
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        assert_eq!("orange".parse::<Color>().unwrap(), Color::rgb(255, 165, 0));
        assert_eq!("Pink".parse::<Color>().unwrap(), Color::rgb(255, 192, 203));
        assert_eq!(Color::named("brown"), Some(Color::rgb(165, 42, 42)));
        assert_eq!(Color::named("teal"), None);
    }

    #[test]
    fn hex_matches_raw_triple() {
        for (r, g, b) in [(0u8, 255u8, 139u8), (0, 0, 0), (255, 255, 255), (18, 171, 205)] {
            let hex = format!("#{r:02X}{g:02X}{b:02x}");
            assert_eq!(hex.parse::<Color>().unwrap(), Color::from([r, g, b]));
        }
    }

    #[test]
    fn display_is_hex() {
        let color = Color::rgb(0, 255, 139);
        assert_eq!(color.to_string(), "#00FF8B");
        assert_eq!(color.to_string().parse::<Color>().unwrap(), color);
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "#12345", "#1234567", "#GG0000", "00FF8B", "ultraviolet", "#ÿÿÿ"] {
            assert!(
                matches!(input.parse::<Color>(), Err(FrameError::InvalidCommand(_))),
                "accepted {input:?}"
            );
        }
    }
}
