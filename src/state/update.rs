// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sparse result of one light operation.

use crate::device::PilotState;
use crate::types::{Brightness, DeviceIdentity, PowerState, RgbColor, SceneId};

use super::DeviceSnapshot;

/// What one operation observed about a light.
///
/// Each field is either absent (not observed) or fully valid. A light that
/// reports no active scene yields an update that clears the snapshot's scene.
/// A failed operation yields an update carrying only [`error`](Self::error); a
/// successful one carries no error, which clears any error left on the
/// snapshot by an earlier operation.
///
/// # Examples
///
/// ```
/// use wiz_bridge::state::{DeviceSnapshot, StateUpdate};
/// use wiz_bridge::types::PowerState;
///
/// let mut light = DeviceSnapshot::new([10, 0, 0, 5], None);
///
/// StateUpdate::failure("device at 10.0.0.5 is unreachable").apply(&mut light);
/// assert_eq!(light.last_error(), Some("device at 10.0.0.5 is unreachable"));
/// assert!(light.power().is_none());
///
/// StateUpdate::new().with_power(PowerState::Off).apply(&mut light);
/// assert_eq!(light.power(), Some(PowerState::Off));
/// assert!(light.last_error().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    power: Option<PowerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brightness: Option<Brightness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<RgbColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scene: Option<SceneId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    scene_cleared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<DeviceIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl StateUpdate {
    /// Creates an empty update: nothing observed, no error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an update for a failed operation.
    ///
    /// All state fields are absent.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Converts a state query answer.
    ///
    /// Values a light can report but that are not valid state are dropped:
    /// fewer than three color channels, a blank hardware id. Scene `0` is
    /// reported as "no scene active" and clears the scene.
    #[must_use]
    pub fn from_pilot(pilot: &PilotState) -> Self {
        let (scene, scene_cleared) = match pilot.scene_id {
            Some(0) => (None, true),
            Some(id) => (SceneId::new(id).ok(), false),
            None => (None, false),
        };
        Self {
            power: pilot.state.map(PowerState::from),
            brightness: pilot.brightness.map(Brightness::from),
            color: RgbColor::from_channels(&pilot.color),
            scene,
            scene_cleared,
            identity: DeviceIdentity::from_reported(pilot.identity.as_deref()),
            error: None,
        }
    }

    /// Sets the observed power state.
    #[must_use]
    pub fn with_power(mut self, power: PowerState) -> Self {
        self.power = Some(power);
        self
    }

    /// Sets the observed brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the observed color.
    #[must_use]
    pub fn with_color(mut self, color: RgbColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the observed scene.
    #[must_use]
    pub fn with_scene(mut self, scene: SceneId) -> Self {
        self.scene = Some(scene);
        self.scene_cleared = false;
        self
    }

    /// Records that no scene is active.
    #[must_use]
    pub fn without_scene(mut self) -> Self {
        self.scene = None;
        self.scene_cleared = true;
        self
    }

    /// Sets the observed hardware id.
    #[must_use]
    pub fn with_identity(mut self, identity: DeviceIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Returns the observed power state.
    #[must_use]
    pub fn power(&self) -> Option<PowerState> {
        self.power
    }

    /// Returns the observed brightness.
    #[must_use]
    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    /// Returns the observed color.
    #[must_use]
    pub fn color(&self) -> Option<RgbColor> {
        self.color
    }

    /// Returns the observed scene.
    #[must_use]
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Returns true if the light reported that no scene is active.
    #[must_use]
    pub fn clears_scene(&self) -> bool {
        self.scene_cleared
    }

    /// Returns the observed hardware id.
    #[must_use]
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    /// Returns the error message. An empty message counts as no error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }

    /// Returns true if the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error().is_none()
    }

    /// Applies this update to a snapshot.
    ///
    /// Present fields overwrite, absent ones leave the snapshot alone, a
    /// cleared scene unsets the snapshot's scene, and
    /// the snapshot's error is always replaced by this update's (cleared on
    /// success). Returns true if the snapshot changed.
    pub fn apply(&self, snapshot: &mut DeviceSnapshot) -> bool {
        snapshot.apply(self)
    }

    pub(crate) fn replace_identity(&mut self, identity: Option<DeviceIdentity>) {
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated_snapshot() -> DeviceSnapshot {
        let mut snapshot = DeviceSnapshot::new([192, 168, 1, 10], None);
        StateUpdate::new()
            .with_power(PowerState::On)
            .with_brightness(Brightness::from(40))
            .with_color(RgbColor::new(1, 2, 3))
            .with_scene(SceneId::new(5).unwrap())
            .with_identity(DeviceIdentity::new("a8bb50000010").unwrap())
            .apply(&mut snapshot);
        StateUpdate::failure("stale").apply(&mut snapshot);
        snapshot
    }

    #[test]
    fn empty_update_only_clears_error() {
        let mut snapshot = populated_snapshot();
        let before = snapshot.clone();

        StateUpdate::new().apply(&mut snapshot);

        assert_eq!(snapshot.last_error(), None);
        assert_eq!(snapshot.power(), before.power());
        assert_eq!(snapshot.brightness(), before.brightness());
        assert_eq!(snapshot.color(), before.color());
        assert_eq!(snapshot.scene(), before.scene());
        assert_eq!(snapshot.identity(), before.identity());
    }

    #[test]
    fn error_only_update_changes_nothing_else() {
        let mut snapshot = populated_snapshot();
        StateUpdate::new().apply(&mut snapshot);
        let before = snapshot.clone();

        StateUpdate::failure("timed out").apply(&mut snapshot);

        assert_eq!(snapshot.last_error(), Some("timed out"));
        assert_eq!(snapshot.power(), before.power());
        assert_eq!(snapshot.brightness(), before.brightness());
        assert_eq!(snapshot.color(), before.color());
        assert_eq!(snapshot.scene(), before.scene());
        assert_eq!(snapshot.identity(), before.identity());
    }

    #[test]
    fn empty_error_message_counts_as_success() {
        let update = StateUpdate::failure("");
        assert!(update.is_success());
        assert_eq!(update.error(), None);

        let mut snapshot = populated_snapshot();
        update.apply(&mut snapshot);
        assert_eq!(snapshot.last_error(), None);
    }

    #[test]
    fn from_pilot_keeps_valid_fields() {
        let pilot = PilotState::new()
            .with_state(false)
            .with_brightness(255)
            .with_rgb(10, 20, 30)
            .with_scene_id(12)
            .with_identity("A8BB50000001");

        let update = StateUpdate::from_pilot(&pilot);

        assert_eq!(update.power(), Some(PowerState::Off));
        assert_eq!(update.brightness(), Some(Brightness::MAX));
        assert_eq!(update.color(), Some(RgbColor::new(10, 20, 30)));
        assert_eq!(update.scene().map(|s| s.value()), Some(12));
        assert_eq!(update.identity().map(DeviceIdentity::as_str), Some("a8bb50000001"));
        assert!(update.is_success());
    }

    #[test]
    fn from_pilot_drops_partial_color() {
        let pilot = PilotState::new().with_channels(vec![Some(10), Some(20)]);
        assert_eq!(StateUpdate::from_pilot(&pilot).color(), None);

        let pilot = PilotState::new().with_channels(vec![Some(10), None, Some(30)]);
        assert_eq!(StateUpdate::from_pilot(&pilot).color(), None);
    }

    #[test]
    fn from_pilot_scene_zero_clears_scene() {
        let pilot = PilotState::new().with_scene_id(0).with_identity("  ");
        let update = StateUpdate::from_pilot(&pilot);
        assert_eq!(update.scene(), None);
        assert!(update.clears_scene());
        assert_eq!(update.identity(), None);

        let mut snapshot = populated_snapshot();
        assert!(update.apply(&mut snapshot));
        assert_eq!(snapshot.scene(), None);
        assert_eq!(snapshot.power(), Some(PowerState::On));
    }

    #[test]
    fn unreported_scene_is_left_alone() {
        let update = StateUpdate::from_pilot(&PilotState::new().with_state(true));
        assert!(!update.clears_scene());

        let mut snapshot = populated_snapshot();
        update.apply(&mut snapshot);
        assert_eq!(snapshot.scene(), SceneId::new(5).ok());
    }

    #[test]
    fn cleared_scene_serializes_as_flag() {
        let update = StateUpdate::new().without_scene();
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "scene_cleared": true }));

        let back: StateUpdate = serde_json::from_value(json).unwrap();
        assert!(back.clears_scene());
    }

    #[test]
    fn failure_has_no_state() {
        let update = StateUpdate::failure("command rejected: busy");
        assert_eq!(update.power(), None);
        assert_eq!(update.brightness(), None);
        assert_eq!(update.color(), None);
        assert_eq!(update.scene(), None);
        assert_eq!(update.identity(), None);
        assert!(!update.is_success());
    }

    #[test]
    fn serializes_sparse() {
        let update = StateUpdate::new()
            .with_power(PowerState::On)
            .with_brightness(Brightness::from(9));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "power": "on", "brightness": 9 }));

        let back: StateUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(back, update);
    }
}
