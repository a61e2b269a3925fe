//! RGBA colors.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec", into = "ColorSpec")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);
    pub const NAVY: Color = Color::rgb(0, 0, 128);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgba(red, green, blue, 255)
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn gray(level: u8) -> Self {
        Self::rgb(level, level, level)
    }

    pub fn named(name: &str) -> Option<Self> {
        let color = match name.to_ascii_lowercase().as_str() {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "gray" | "grey" => Self::GRAY,
            "red" => Self::RED,
            "green" => Self::GREEN,
            "blue" => Self::BLUE,
            "yellow" => Self::YELLOW,
            "purple" => Self::PURPLE,
            "navy" => Self::NAVY,
            "orange" => Self::rgb(255, 165, 0),
            "pink" => Self::rgb(255, 192, 203),
            "cyan" => Self::rgb(0, 255, 255),
            "magenta" => Self::rgb(255, 0, 255),
            "transparent" => Self::TRANSPARENT,
            _ => return None,
        };
        Some(color)
    }

    /// Scales the color channels by `factor` in `[0, 1]`, keeping alpha. Values outside the
    /// range are clamped.
    pub fn faded(self, factor: f64) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |channel: u8| (channel as f64 * factor) as u8;
        Self::rgba(
            scale(self.red),
            scale(self.green),
            scale(self.blue),
            self.alpha,
        )
    }

    /// Average of the three color channels as a gray level, scaled by `factor`.
    pub fn grayscale(self, factor: f64) -> Self {
        let average = (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0;
        Self::gray((average * factor.clamp(0.0, 1.0)) as u8)
    }

    pub fn to_hex(self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("unknown color name {0:?}")]
    UnknownName(String),
    #[error("malformed hex color {0:?}")]
    MalformedHex(String),
    #[error("color needs 3 or 4 channels, got {0}")]
    ChannelCount(usize),
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(hex) = s.strip_prefix('#') else {
            return Color::named(s).ok_or_else(|| ColorError::UnknownName(s.to_string()));
        };

        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(ColorError::MalformedHex(s.to_string()));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ColorError::MalformedHex(s.to_string()))
        };
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

/// Document representation of a color: a name, a `#RRGGBB[AA]` string, or a channel list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Text(String),
    Channels(Vec<u8>),
}

impl TryFrom<ColorSpec> for Color {
    type Error = ColorError;

    fn try_from(value: ColorSpec) -> Result<Self, Self::Error> {
        match value {
            ColorSpec::Text(text) => text.parse(),
            ColorSpec::Channels(channels) => match channels[..] {
                [r, g, b] => Ok(Color::rgb(r, g, b)),
                [r, g, b, a] => Ok(Color::rgba(r, g, b, a)),
                _ => Err(ColorError::ChannelCount(channels.len())),
            },
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(value: Color) -> Self {
        ColorSpec::Text(value.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::name("red", Ok(Color::RED))]
    #[case::name_case("Purple", Ok(Color::PURPLE))]
    #[case::hex("#FF0000", Ok(Color::RED))]
    #[case::hex_alpha("#00008080", Ok(Color::rgba(0, 0, 128, 128)))]
    #[case::hex_lowercase("#ff00ff", Ok(Color::rgb(255, 0, 255)))]
    #[case::unknown("mauve", Err(ColorError::UnknownName("mauve".to_string())))]
    #[case::short_hex("#FFF", Err(ColorError::MalformedHex("#FFF".to_string())))]
    #[case::bad_digit("#GG0000", Err(ColorError::MalformedHex("#GG0000".to_string())))]
    fn test_color_from_str(#[case] text: &str, #[case] expected: Result<Color, ColorError>) {
        assert_eq!(text.parse::<Color>(), expected);
    }

    #[rstest]
    #[case(ColorSpec::Channels(vec![1, 2, 3]), Ok(Color::rgb(1, 2, 3)))]
    #[case(ColorSpec::Channels(vec![1, 2, 3, 4]), Ok(Color::rgba(1, 2, 3, 4)))]
    #[case(ColorSpec::Channels(vec![1, 2]), Err(ColorError::ChannelCount(2)))]
    fn test_color_from_channels(
        #[case] channels: ColorSpec,
        #[case] expected: Result<Color, ColorError>,
    ) {
        assert_eq!(Color::try_from(channels), expected);
    }

    #[test]
    fn test_color_hex_round_trip() {
        let color = Color::rgba(18, 52, 86, 120);
        assert_eq!(color.to_hex(), "#12345678");
        assert_eq!(color.to_hex().parse::<Color>(), Ok(color));
    }

    #[rstest]
    #[case(1.0, Color::rgb(200, 100, 50))]
    #[case(0.5, Color::rgb(100, 50, 25))]
    #[case(0.0, Color::rgb(0, 0, 0))]
    #[case(-1.0, Color::rgb(0, 0, 0))]
    fn test_color_faded(#[case] factor: f64, #[case] expected: Color) {
        assert_eq!(Color::rgb(200, 100, 50).faded(factor), expected);
    }

    #[test]
    fn test_color_grayscale() {
        assert_eq!(Color::rgb(30, 60, 90).grayscale(1.0), Color::gray(60));
        assert_eq!(Color::rgb(30, 60, 90).grayscale(0.5), Color::gray(30));
    }
}
