// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light control command.

use crate::types::{Brightness, RgbColor, SceneId};

/// Settings to apply while turning a light on.
///
/// Every command implies the light ends up on; there is no way to set a
/// color on a light and leave it off.
///
/// # Examples
///
/// ```
/// use wiz_bridge::command::LightCommand;
/// use wiz_bridge::types::{Brightness, RgbColor};
///
/// let cmd = LightCommand::color(RgbColor::new(255, 0, 0))
///     .with_brightness(Brightness::new(64).unwrap());
///
/// assert_eq!(cmd.get_color(), Some(RgbColor::new(255, 0, 0)));
/// assert_eq!(cmd.get_brightness().map(|b| b.value()), Some(64));
/// assert!(cmd.get_scene().is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LightCommand {
    brightness: Option<Brightness>,
    color: Option<RgbColor>,
    scene: Option<SceneId>,
}

impl LightCommand {
    /// Creates a command that only turns the light on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            brightness: None,
            color: None,
            scene: None,
        }
    }

    /// Creates a command that sets the brightness.
    #[must_use]
    pub const fn brightness(value: Brightness) -> Self {
        Self::new().with_brightness(value)
    }

    /// Creates a command that sets the color.
    #[must_use]
    pub const fn color(value: RgbColor) -> Self {
        Self::new().with_color(value)
    }

    /// Creates a command that starts a preset scene.
    #[must_use]
    pub const fn scene(value: SceneId) -> Self {
        Self::new().with_scene(value)
    }

    /// Adds a brightness to the command.
    #[must_use]
    pub const fn with_brightness(mut self, value: Brightness) -> Self {
        self.brightness = Some(value);
        self
    }

    /// Adds a color to the command.
    #[must_use]
    pub const fn with_color(mut self, value: RgbColor) -> Self {
        self.color = Some(value);
        self
    }

    /// Adds a scene to the command.
    #[must_use]
    pub const fn with_scene(mut self, value: SceneId) -> Self {
        self.scene = Some(value);
        self
    }

    /// Returns the requested brightness.
    #[must_use]
    pub const fn get_brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    /// Returns the requested color.
    #[must_use]
    pub const fn get_color(&self) -> Option<RgbColor> {
        self.color
    }

    /// Returns the requested scene.
    #[must_use]
    pub const fn get_scene(&self) -> Option<SceneId> {
        self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_command() {
        let cmd = LightCommand::scene(SceneId::new(6).unwrap());
        assert_eq!(cmd.get_scene().map(|s| s.value()), Some(6));
        assert!(cmd.get_color().is_none());
    }

    #[test]
    fn builders_combine() {
        let cmd = LightCommand::new()
            .with_color(RgbColor::new(1, 2, 3))
            .with_scene(SceneId::new(2).unwrap());
        assert_eq!(cmd.get_color(), Some(RgbColor::new(1, 2, 3)));
        assert_eq!(cmd.get_scene().map(|s| s.value()), Some(2));
    }
}
