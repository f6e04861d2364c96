// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable hardware identity of a light.

use std::fmt;

use crate::error::ValueError;

/// Hardware identity of a light, normally its MAC address.
///
/// Addresses can change between discovery passes (DHCP), the identity does
/// not. Identities are stored trimmed and lowercased so the same device
/// reported by two sources compares equal.
///
/// # Examples
///
/// ```
/// use wiz_bridge::types::DeviceIdentity;
///
/// let id = DeviceIdentity::new(" A8BB50E1F2C3 ").unwrap();
/// assert_eq!(id.as_str(), "a8bb50e1f2c3");
///
/// assert!(DeviceIdentity::new("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    /// Creates an identity from a reported hardware id.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidIdentity` if the id is blank or contains
    /// whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValueError> {
        let raw = raw.as_ref();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ValueError::InvalidIdentity(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Converts an optional reported id, treating blank or malformed values
    /// as "not reported".
    #[must_use]
    pub fn from_reported(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|raw| Self::new(raw).ok())
    }

    /// Returns the normalized identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceIdentity({})", self.0)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceIdentity {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DeviceIdentity {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceIdentity> for String {
    fn from(id: DeviceIdentity) -> Self {
        id.0
    }
}
