// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection handle to one light.
//!
//! The wire protocol lives outside this crate. A protocol implementation
//! provides a [`DeviceHandle`] per light; the bridge owns every handle on its
//! worker thread and drives it from there, so handle futures never need to be
//! `Send`.

use std::net::IpAddr;

use crate::command::LightCommand;
use crate::error::DeviceError;

/// Raw state reported by a light in answer to a state query.
///
/// Fields are whatever the light sent, unvalidated. Conversion into a
/// [`StateUpdate`](crate::state::StateUpdate) drops anything that is not
/// fully valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PilotState {
    /// On/off state.
    pub state: Option<bool>,
    /// Brightness level (0-255).
    pub brightness: Option<u8>,
    /// Color channels in red, green, blue order. Empty when not reported.
    pub color: Vec<Option<u8>>,
    /// Active scene id; `0` means no scene.
    pub scene_id: Option<u16>,
    /// Hardware id (MAC address).
    pub identity: Option<String>,
}

impl PilotState {
    /// Creates an empty pilot state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the on/off state.
    #[must_use]
    pub fn with_state(mut self, on: bool) -> Self {
        self.state = Some(on);
        self
    }

    /// Sets the brightness level.
    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets all three color channels.
    #[must_use]
    pub fn with_rgb(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.color = vec![Some(red), Some(green), Some(blue)];
        self
    }

    /// Sets the raw color channels as reported.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<Option<u8>>) -> Self {
        self.color = channels;
        self
    }

    /// Sets the active scene id.
    #[must_use]
    pub fn with_scene_id(mut self, scene_id: u16) -> Self {
        self.scene_id = Some(scene_id);
        self
    }

    /// Sets the reported hardware id.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

/// Connection to one light.
///
/// Methods take `&self`; implementations keep any connection state behind
/// interior mutability. Calls may overlap: the worker interleaves units of
/// work at every `.await`.
#[allow(async_fn_in_trait)]
pub trait DeviceHandle {
    /// Returns the network address this handle talks to.
    fn address(&self) -> IpAddr;

    /// Turns the light on, optionally applying a command in the same request.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the request fails or the light refuses it.
    async fn turn_on(&self, command: Option<&LightCommand>) -> Result<(), DeviceError>;

    /// Turns the light off.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the request fails or the light refuses it.
    async fn turn_off(&self) -> Result<(), DeviceError>;

    /// Queries the current state.
    ///
    /// `Ok(None)` means the light acknowledged but returned no state.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the query fails.
    async fn query_state(&self) -> Result<Option<PilotState>, DeviceError>;

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the transport fails to close cleanly.
    async fn close(&self) -> Result<(), DeviceError>;
}
