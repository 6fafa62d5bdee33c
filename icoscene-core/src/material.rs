//! Surface appearance for scene nodes

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Linear RGB colour with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Rec. 709 relative luminance
    pub fn luminance(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let digits = value.trim().trim_start_matches('#').trim_start_matches("0x");
        if digits.len() != 6 {
            return Err(Error::Config(format!("colour must be #rrggbb, got {value:?}")));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_hex)
            .map_err(|_| Error::Config(format!("colour must be #rrggbb, got {value:?}")))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        format!("#{:06x}", color.to_hex())
    }
}

/// Material describing how a node's mesh is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lit surface; with `flat_shading` every face takes its face normal
    Standard { color: Color, flat_shading: bool },
    /// Unlit, edges only
    Wireframe { color: Color },
}

impl Material {
    pub fn standard(color: Color, flat_shading: bool) -> Self {
        Self::Standard {
            color,
            flat_shading,
        }
    }

    pub fn wireframe(color: Color) -> Self {
        Self::Wireframe { color }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Standard { color, .. } | Self::Wireframe { color } => *color,
        }
    }

    pub fn is_wireframe(&self) -> bool {
        matches!(self, Self::Wireframe { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_channels() {
        let c = Color::from_hex(0x0099ff);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 0.6).abs() < 1e-6);
        assert_eq!(c.b, 1.0);
        assert_eq!(c.to_hex(), 0x0099ff);
    }

    #[test]
    fn test_parse_colour_string() {
        let c = Color::try_from("#aa5500".to_string()).unwrap();
        assert_eq!(c.to_hex(), 0xaa5500);
        assert!(Color::try_from("#fff".to_string()).is_err());
        assert!(Color::try_from("#zzzzzz".to_string()).is_err());
        assert_eq!(String::from(Color::WHITE), "#ffffff");
    }

    #[test]
    fn test_material_kind() {
        assert!(Material::wireframe(Color::WHITE).is_wireframe());
        assert!(!Material::standard(Color::WHITE, true).is_wireframe());
    }
}
