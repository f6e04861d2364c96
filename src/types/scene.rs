// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Preset scene identifier.
//!
//! Lights ship with numbered built-in scenes. Id `0` is what a light reports
//! when no scene is active, so it is not a valid scene to request.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// A built-in preset scene number (1 and above).
///
/// # Examples
///
/// ```
/// use wiz_bridge::types::SceneId;
///
/// let ocean = SceneId::new(1).unwrap();
/// assert_eq!(ocean.value(), 1);
/// assert!(SceneId::new(0).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct SceneId(u16);

impl SceneId {
    /// Creates a scene id.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidScene` for id `0`.
    pub fn new(id: u16) -> Result<Self, ValueError> {
        if id == 0 {
            return Err(ValueError::InvalidScene(id.to_string()));
        }
        Ok(Self(id))
    }

    /// Returns the scene number.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for SceneId {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SceneId> for u16 {
    fn from(id: SceneId) -> Self {
        id.0
    }
}

impl FromStr for SceneId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u16 = s
            .trim()
            .parse()
            .map_err(|_| ValueError::InvalidScene(s.to_string()))?;
        Self::new(id)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
