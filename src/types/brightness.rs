// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for dimming control.
//!
//! Values arrive from user input as wider integers, so construction takes a
//! `u16` and rejects anything above 255 before it can reach a light.

use std::fmt;

use crate::error::ValueError;

/// Brightness level (0-255).
///
/// # Examples
///
/// ```
/// use wiz_bridge::types::Brightness;
///
/// let dim = Brightness::new(128).unwrap();
/// assert_eq!(dim.value(), 128);
///
/// // Out-of-range input is rejected before it reaches the bridge
/// assert!(Brightness::new(400).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness.
    pub const MIN: Self = Self(0);

    /// Maximum brightness.
    pub const MAX: Self = Self(255);

    /// Creates a brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 255.
    pub fn new(value: u16) -> Result<Self, ValueError> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| ValueError::OutOfRange {
                min: 0,
                max: 255,
                actual: value,
            })
    }

    /// Returns the raw level.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
