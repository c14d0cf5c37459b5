//! LED colors and patterns.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const OFF: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const ORANGE: Color = Color::rgb(255, 80, 0);
    pub const YELLOW: Color = Color::rgb(255, 160, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const PURPLE: Color = Color::rgb(20, 0, 50);
    pub const DRIVING_METEOR: Color = Color::rgb(255, 0, 0);
    pub const CLIMBING_METEOR: Color = Color::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` in [0, 1]
    pub fn dimmed(self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f64 * f).round() as u8;
        Self::rgb(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// What an LED strip shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LedPattern {
    Solid(Color),
    /// A bright head sweeping along the strip, leaving a trail that loses
    /// `decay` of its brightness per LED behind the head
    MeteorRain { color: Color, decay: f64 },
}

impl Default for LedPattern {
    fn default() -> Self {
        LedPattern::Solid(Color::OFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimmed() {
        assert_eq!(Color::WHITE.dimmed(0.5), Color::rgb(128, 128, 128));
        assert_eq!(Color::ORANGE.dimmed(2.0), Color::ORANGE);
        assert_eq!(Color::ORANGE.dimmed(0.0), Color::OFF);
    }
}
