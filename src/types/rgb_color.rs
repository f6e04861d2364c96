// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with hex and component-list parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use wiz_bridge::types::RgbColor;
///
/// let orange = RgbColor::new(255, 128, 0);
/// assert_eq!(orange.to_hex(), "FF8000");
///
/// // Parse user input, either hex or a component list
/// assert_eq!("#FF8000".parse::<RgbColor>().unwrap(), orange);
/// assert_eq!("255, 128, 0".parse::<RgbColor>().unwrap(), orange);
/// assert_eq!("255 128 0".parse::<RgbColor>().unwrap(), orange);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Builds a color from channels reported by a device.
    ///
    /// Devices may report fewer than three channels, or leave some unset.
    /// Anything short of three present channels yields `None`: a color is
    /// never partially applied. Channels past the third are ignored.
    ///
    /// ```
    /// use wiz_bridge::types::RgbColor;
    ///
    /// assert_eq!(
    ///     RgbColor::from_channels(&[Some(1), Some(2), Some(3)]),
    ///     Some(RgbColor::new(1, 2, 3))
    /// );
    /// assert_eq!(RgbColor::from_channels(&[Some(1), Some(2)]), None);
    /// assert_eq!(RgbColor::from_channels(&[Some(1), None, Some(3)]), None);
    /// ```
    #[must_use]
    pub fn from_channels(channels: &[Option<u8>]) -> Option<Self> {
        match channels {
            [Some(red), Some(green), Some(blue), ..] => Some(Self::new(*red, *green, *blue)),
            _ => None,
        }
    }

    /// Parses an RGB color from a hex string.
    ///
    /// Accepts formats: `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB`
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` if the hex string is invalid.
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValueError::InvalidColor(hex.to_string()));
        }

        match digits.len() {
            3 => {
                let mut expanded = [0u8; 3];
                for (slot, c) in expanded.iter_mut().zip(digits.chars()) {
                    // Expand 0-F to 0-255
                    *slot = parse_hex_digit(c, hex)? * 17;
                }
                Ok(Self::new(expanded[0], expanded[1], expanded[2]))
            }
            6 => Ok(Self::new(
                parse_hex_pair(&digits[0..2], hex)?,
                parse_hex_pair(&digits[2..4], hex)?,
                parse_hex_pair(&digits[4..6], hex)?,
            )),
            _ => Err(ValueError::InvalidColor(hex.to_string())),
        }
    }

    /// Parses a component list such as `255,128,0` or `255 128 0`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidColor` unless there are exactly three
    /// integer components, and `ValueError::OutOfRange` if one exceeds 255.
    pub fn from_components(text: &str) -> Result<Self, ValueError> {
        let parts: Vec<&str> = text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();

        let [red, green, blue] = parts.as_slice() else {
            return Err(ValueError::InvalidColor(format!(
                "{text:?} must have three components"
            )));
        };

        Ok(Self::new(
            parse_component(red)?,
            parse_component(green)?,
            parse_component(blue)?,
        ))
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the three channels in order.
    #[must_use]
    pub const fn channels(&self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    /// Returns the color as a hex string without the hash prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(ValueError::InvalidColor("a color is required".to_string()));
        }

        let bare_hex = !value.contains([',', ' '])
            && matches!(value.len(), 3 | 6)
            && value.chars().all(|c| c.is_ascii_hexdigit());

        if value.starts_with('#') || bare_hex {
            Self::from_hex(value)
        } else {
            Self::from_components(value)
        }
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl From<[u8; 3]> for RgbColor {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::new(red, green, blue)
    }
}

fn parse_hex_digit(c: char, original: &str) -> Result<u8, ValueError> {
    c.to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| ValueError::InvalidColor(original.to_string()))
}

fn parse_hex_pair(pair: &str, original: &str) -> Result<u8, ValueError> {
    u8::from_str_radix(pair, 16).map_err(|_| ValueError::InvalidColor(original.to_string()))
}

fn parse_component(part: &str) -> Result<u8, ValueError> {
    let value: u16 = part
        .parse()
        .map_err(|_| ValueError::InvalidColor(format!("{part:?} is not an integer")))?;
    u8::try_from(value).map_err(|_| ValueError::OutOfRange {
        min: 0,
        max: 255,
        actual: value,
    })
}
