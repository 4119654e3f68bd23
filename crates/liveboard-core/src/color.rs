//! Colors for layer fills and per-connection highlights.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque RGB color as stored on layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// CSS hex notation, e.g. `#f35223`.
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<peniko::Color> for Color {
    fn from(color: peniko::Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
        }
    }
}

impl From<Color> for peniko::Color {
    fn from(color: Color) -> Self {
        peniko::Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}

/// Fill colors offered by the color picker.
pub const FILL_PALETTE: [Color; 8] = [
    Color::new(243, 82, 35),
    Color::new(255, 249, 177),
    Color::new(68, 202, 99),
    Color::new(39, 142, 237),
    Color::new(155, 105, 245),
    Color::new(252, 142, 42),
    Color::black(),
    Color::white(),
];

/// Colors used to tell connections apart (cursors, selection outlines).
pub const CONNECTION_PALETTE: [Color; 5] = [
    Color::new(0xdc, 0x26, 0x26),
    Color::new(0xd9, 0x77, 0x06),
    Color::new(0x05, 0x96, 0x69),
    Color::new(0x7c, 0x3a, 0xed),
    Color::new(0xdb, 0x27, 0x77),
];

/// Map a connection identifier onto [`CONNECTION_PALETTE`].
///
/// Uses FNV-1a so the mapping is identical on every peer and every run,
/// unlike `std`'s randomly keyed hasher.
pub fn connection_id_to_color(connection_id: &str) -> Color {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = connection_id
        .bytes()
        .fold(FNV_OFFSET, |acc, byte| (acc ^ u64::from(byte)).wrapping_mul(FNV_PRIME));
    CONNECTION_PALETTE[(hash % CONNECTION_PALETTE.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_color_is_deterministic() {
        let a = connection_id_to_color("connection-42");
        let b = connection_id_to_color("connection-42");
        assert_eq!(a, b);
        assert!(CONNECTION_PALETTE.contains(&a));
    }

    #[test]
    fn test_connection_colors_spread_over_palette() {
        let used: std::collections::HashSet<Color> = (0..64)
            .map(|i| connection_id_to_color(&i.to_string()))
            .collect();
        assert!(used.len() > 1);
    }

    #[test]
    fn test_css_hex() {
        assert_eq!(Color::new(243, 82, 35).to_css(), "#f35223");
        assert_eq!(Color::from_hex("#f35223"), Some(Color::new(243, 82, 35)));
        assert_eq!(Color::from_hex("fff"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_peniko_conversion() {
        let color = Color::new(39, 142, 237);
        let peniko_color: peniko::Color = color.into();
        assert_eq!(Color::from(peniko_color), color);
    }
}
