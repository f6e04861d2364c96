// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Foreground view of one light.

use std::net::IpAddr;

use crate::types::{Brightness, DeviceIdentity, PowerState, RgbColor, SceneId};

use super::StateUpdate;

/// Point-in-time view of one light, owned by the caller.
///
/// Snapshots are produced by discovery and updated in place by applying the
/// [`StateUpdate`] returned from each bridge call. Every field except the
/// address may be unknown.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceSnapshot {
    address: IpAddr,
    identity: Option<DeviceIdentity>,
    power: Option<PowerState>,
    brightness: Option<Brightness>,
    color: Option<RgbColor>,
    scene: Option<SceneId>,
    last_error: Option<String>,
}

impl DeviceSnapshot {
    /// Creates a snapshot with nothing known beyond address and identity.
    #[must_use]
    pub fn new(address: impl Into<IpAddr>, identity: Option<DeviceIdentity>) -> Self {
        Self {
            address: address.into(),
            identity,
            power: None,
            brightness: None,
            color: None,
            scene: None,
            last_error: None,
        }
    }

    /// Creates a snapshot from the outcome of a state query.
    #[must_use]
    pub fn from_update(
        address: IpAddr,
        identity: Option<DeviceIdentity>,
        update: &StateUpdate,
    ) -> Self {
        let mut snapshot = Self::new(address, identity);
        snapshot.apply(update);
        snapshot
    }

    /// Returns the network address.
    #[must_use]
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns the hardware id, if learned.
    #[must_use]
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        self.identity.as_ref()
    }

    /// Returns the on/off state, if known.
    #[must_use]
    pub fn power(&self) -> Option<PowerState> {
        self.power
    }

    /// Returns the brightness, if known.
    #[must_use]
    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    /// Returns the color, if known.
    #[must_use]
    pub fn color(&self) -> Option<RgbColor> {
        self.color
    }

    /// Returns the active scene, if known.
    #[must_use]
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Returns the error left by the last operation, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns true if the light is known to be on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.power.is_some_and(|p| p.is_on())
    }

    /// Returns the label shown to users: the identity when known, otherwise
    /// the address.
    ///
    /// ```
    /// use wiz_bridge::state::DeviceSnapshot;
    /// use wiz_bridge::types::DeviceIdentity;
    ///
    /// let anonymous = DeviceSnapshot::new([10, 0, 0, 2], None);
    /// assert_eq!(anonymous.label(), "10.0.0.2");
    ///
    /// let known = DeviceSnapshot::new(
    ///     [10, 0, 0, 2],
    ///     Some(DeviceIdentity::new("a8bb50000002").unwrap()),
    /// );
    /// assert_eq!(known.label(), "a8bb50000002");
    /// ```
    #[must_use]
    pub fn label(&self) -> String {
        match &self.identity {
            Some(identity) => identity.to_string(),
            None => self.address.to_string(),
        }
    }

    /// Applies an update.
    ///
    /// Returns true if any field changed.
    pub fn apply(&mut self, update: &StateUpdate) -> bool {
        let mut changed = false;

        macro_rules! overwrite_if_some {
            ($field:ident, $value:expr) => {
                if let Some(v) = $value {
                    if self.$field.as_ref() != Some(&v) {
                        self.$field = Some(v);
                        changed = true;
                    }
                }
            };
        }

        overwrite_if_some!(power, update.power());
        overwrite_if_some!(brightness, update.brightness());
        overwrite_if_some!(color, update.color());
        overwrite_if_some!(scene, update.scene());
        if update.clears_scene() && self.scene.take().is_some() {
            changed = true;
        }
        overwrite_if_some!(identity, update.identity().cloned());

        let error = update.error().map(str::to_owned);
        if self.last_error != error {
            self.last_error = error;
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snapshot_is_unknown() {
        let snapshot = DeviceSnapshot::new([192, 168, 1, 4], None);
        assert_eq!(snapshot.address(), IpAddr::from([192, 168, 1, 4]));
        assert!(snapshot.power().is_none());
        assert!(snapshot.brightness().is_none());
        assert!(snapshot.color().is_none());
        assert!(snapshot.scene().is_none());
        assert!(snapshot.last_error().is_none());
        assert!(!snapshot.is_on());
    }

    #[test]
    fn apply_reports_change() {
        let mut snapshot = DeviceSnapshot::new([192, 168, 1, 4], None);
        let update = StateUpdate::new().with_power(PowerState::On);

        assert!(snapshot.apply(&update));
        assert!(snapshot.is_on());

        // Applying the same update again changes nothing
        assert!(!snapshot.apply(&update));
    }

    #[test]
    fn identity_from_update_overwrites() {
        let mut snapshot = DeviceSnapshot::new([192, 168, 1, 4], None);
        let id = DeviceIdentity::new("a8bb50000004").unwrap();

        StateUpdate::new()
            .with_identity(id.clone())
            .apply(&mut snapshot);

        assert_eq!(snapshot.identity(), Some(&id));
        assert_eq!(snapshot.label(), "a8bb50000004");
    }

    #[test]
    fn from_update_carries_error() {
        let snapshot = DeviceSnapshot::from_update(
            IpAddr::from([192, 168, 1, 9]),
            None,
            &StateUpdate::failure("no reply after 1000 ms"),
        );
        assert_eq!(snapshot.last_error(), Some("no reply after 1000 ms"));
        assert!(snapshot.power().is_none());
    }
}
