// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory network of scripted lights.
//!
//! [`MockNetwork`] implements [`DiscoveryService`] and hands out
//! [`MockHandle`]s, so a [`Bridge`](crate::bridge::Bridge) can be driven
//! end to end without sockets. Each light's behaviour is looked up at call
//! time, so a test can change it (or remove the light) between calls. Every
//! handle call is recorded.
//!
//! ```
//! use std::net::IpAddr;
//! use wiz_bridge::bridge::{Bridge, BridgeConfig};
//! use wiz_bridge::mock::{MockDevice, MockNetwork};
//!
//! let network = MockNetwork::new()
//!     .with_device(MockDevice::new([10, 0, 0, 1]))
//!     .with_device(MockDevice::new([10, 0, 0, 2]).rejecting_commands());
//! let bridge = Bridge::start(network.clone(), BridgeConfig::new())?;
//! bridge.discover()?;
//!
//! let update = bridge.set_power(IpAddr::from([10, 0, 0, 2]), true)?;
//! assert_eq!(update.error(), Some("command rejected: mock light refused"));
//!
//! network.remove(IpAddr::from([10, 0, 0, 2]));
//! assert_eq!(bridge.discover()?.len(), 1);
//! assert_eq!(network.closed_addresses(), vec![IpAddr::from([10, 0, 0, 2])]);
//! # bridge.shutdown();
//! # Ok::<(), wiz_bridge::Error>(())
//! ```

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::command::LightCommand;
use crate::device::{DeviceHandle, PilotState};
use crate::discovery::{DiscoveryEntry, DiscoveryService};
use crate::error::DeviceError;
use crate::types::DeviceIdentity;

/// Script for one simulated light.
#[derive(Debug, Clone)]
pub struct MockDevice {
    address: IpAddr,
    identity: Option<DeviceIdentity>,
    reported_identity: Option<String>,
    pilot: PilotState,
    reject_commands: bool,
    query_error: bool,
    silent_query: bool,
    delay: Duration,
    close_error: bool,
}

impl MockDevice {
    /// Creates a healthy light that is off at brightness 128.
    #[must_use]
    pub fn new(address: impl Into<IpAddr>) -> Self {
        Self {
            address: address.into(),
            identity: None,
            reported_identity: None,
            pilot: PilotState::new().with_state(false).with_brightness(128),
            reject_commands: false,
            query_error: false,
            silent_query: false,
            delay: Duration::ZERO,
            close_error: false,
        }
    }

    /// Returns the light's address.
    #[must_use]
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Announces `identity` in discovery replies. Invalid ids are ignored.
    #[must_use]
    pub fn with_identity(mut self, identity: impl AsRef<str>) -> Self {
        self.identity = DeviceIdentity::new(identity).ok();
        self
    }

    /// Reports `identity` in state queries instead of the announced one.
    #[must_use]
    pub fn with_reported_identity(mut self, identity: impl Into<String>) -> Self {
        self.reported_identity = Some(identity.into());
        self
    }

    /// Sets the simulated state.
    #[must_use]
    pub fn with_pilot(mut self, pilot: PilotState) -> Self {
        self.pilot = pilot;
        self
    }

    /// Makes on/off and commands fail with [`DeviceError::Rejected`].
    #[must_use]
    pub fn rejecting_commands(mut self) -> Self {
        self.reject_commands = true;
        self
    }

    /// Makes state queries fail with [`DeviceError::Timeout`].
    #[must_use]
    pub fn with_query_error(mut self) -> Self {
        self.query_error = true;
        self
    }

    /// Makes state queries succeed without reporting any state.
    #[must_use]
    pub fn with_silent_query(mut self) -> Self {
        self.silent_query = true;
        self
    }

    /// Delays every handle call by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes `close` fail.
    #[must_use]
    pub fn with_close_error(mut self) -> Self {
        self.close_error = true;
        self
    }

    fn reported_pilot(&self) -> PilotState {
        let mut pilot = self.pilot.clone();
        pilot.identity = self
            .reported_identity
            .clone()
            .or_else(|| self.identity.as_ref().map(ToString::to_string));
        pilot
    }

    fn turn_on(&mut self, command: Option<&LightCommand>) {
        self.pilot.state = Some(true);
        let Some(command) = command else {
            return;
        };
        if let Some(brightness) = command.get_brightness() {
            self.pilot.brightness = Some(brightness.value());
        }
        if let Some(color) = command.get_color() {
            self.pilot.color = color.channels().into_iter().map(Some).collect();
            self.pilot.scene_id = Some(0);
        }
        if let Some(scene) = command.get_scene() {
            self.pilot.scene_id = Some(scene.value());
        }
    }
}

/// One recorded handle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `turn_on`, with its command.
    TurnOn(IpAddr, Option<LightCommand>),
    /// `turn_off`.
    TurnOff(IpAddr),
    /// `query_state`.
    Query(IpAddr),
    /// `close`.
    Close(IpAddr),
}

#[derive(Debug, Default)]
struct Inner {
    devices: Vec<MockDevice>,
    discovery_delay: Duration,
    discovery_error: Option<String>,
    calls: Vec<MockCall>,
    connects: usize,
    closed: Vec<IpAddr>,
}

impl Inner {
    fn device(&mut self, address: IpAddr) -> Option<&mut MockDevice> {
        self.devices.iter_mut().find(|d| d.address == address)
    }
}

/// Shared simulated network.
///
/// Clones share state, so a test keeps one clone to script and inspect the
/// network while the bridge owns another.
#[derive(Debug, Clone, Default)]
pub struct MockNetwork {
    inner: Arc<Mutex<Inner>>,
}

impl MockNetwork {
    /// Creates an empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light.
    #[must_use]
    pub fn with_device(self, device: MockDevice) -> Self {
        self.add(device);
        self
    }

    /// Delays every discovery sweep by `delay`.
    #[must_use]
    pub fn with_discovery_delay(self, delay: Duration) -> Self {
        self.set_discovery_delay(delay);
        self
    }

    /// Adds a light, replacing any light at the same address.
    ///
    /// Lights answer discovery in the order they were added.
    pub fn add(&self, device: MockDevice) {
        let mut inner = self.inner.lock();
        inner.devices.retain(|d| d.address != device.address);
        inner.devices.push(device);
    }

    /// Takes a light off the network. Returns false if it was not there.
    pub fn remove(&self, address: IpAddr) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.devices.len();
        inner.devices.retain(|d| d.address != address);
        inner.devices.len() != before
    }

    /// Changes the delay of later discovery sweeps.
    pub fn set_discovery_delay(&self, delay: Duration) {
        self.inner.lock().discovery_delay = delay;
    }

    /// Makes discovery sweeps fail with `message`, or succeed again with
    /// `None`.
    pub fn set_discovery_error(&self, message: Option<&str>) {
        self.inner.lock().discovery_error = message.map(str::to_owned);
    }

    /// Returns the simulated state of the light at `address`.
    #[must_use]
    pub fn pilot(&self, address: IpAddr) -> Option<PilotState> {
        self.inner.lock().device(address).map(|d| d.pilot.clone())
    }

    /// Returns every handle call so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().calls.clone()
    }

    /// Returns how many handles have been opened.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.inner.lock().connects
    }

    /// Returns the addresses of closed handles, in closing order.
    #[must_use]
    pub fn closed_addresses(&self) -> Vec<IpAddr> {
        self.inner.lock().closed.clone()
    }

    fn record(&self, call: MockCall) -> Duration {
        let mut inner = self.inner.lock();
        let address = match &call {
            MockCall::TurnOn(address, _)
            | MockCall::TurnOff(address)
            | MockCall::Query(address)
            | MockCall::Close(address) => *address,
        };
        inner.calls.push(call);
        inner.device(address).map_or(Duration::ZERO, |d| d.delay)
    }
}

impl DiscoveryService for MockNetwork {
    type Handle = MockHandle;

    async fn discover(
        &self,
        _wait_time: Duration,
        _broadcast_address: &str,
    ) -> Result<Vec<DiscoveryEntry>, DeviceError> {
        let delay = self.inner.lock().discovery_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let inner = self.inner.lock();
        if let Some(message) = &inner.discovery_error {
            return Err(DeviceError::Other(message.clone()));
        }
        Ok(inner
            .devices
            .iter()
            .map(|d| DiscoveryEntry {
                address: d.address,
                identity: d.identity.clone(),
            })
            .collect())
    }

    fn connect(&self, entry: &DiscoveryEntry) -> MockHandle {
        self.inner.lock().connects += 1;
        MockHandle {
            address: entry.address,
            network: self.clone(),
        }
    }
}

/// Handle to one simulated light.
#[derive(Debug, Clone)]
pub struct MockHandle {
    address: IpAddr,
    network: MockNetwork,
}

impl MockHandle {
    async fn pause(&self, call: MockCall) {
        let delay = self.network.record(call);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn unreachable(&self) -> DeviceError {
        DeviceError::Unreachable(self.address.to_string())
    }

    fn mutate(
        &self,
        action: impl FnOnce(&mut MockDevice),
    ) -> Result<(), DeviceError> {
        let mut inner = self.network.inner.lock();
        let device = inner.device(self.address).ok_or_else(|| self.unreachable())?;
        if device.reject_commands {
            return Err(DeviceError::Rejected("mock light refused".to_string()));
        }
        action(device);
        Ok(())
    }
}

impl DeviceHandle for MockHandle {
    fn address(&self) -> IpAddr {
        self.address
    }

    async fn turn_on(&self, command: Option<&LightCommand>) -> Result<(), DeviceError> {
        self.pause(MockCall::TurnOn(self.address, command.copied()))
            .await;
        self.mutate(|device| device.turn_on(command))
    }

    async fn turn_off(&self) -> Result<(), DeviceError> {
        self.pause(MockCall::TurnOff(self.address)).await;
        self.mutate(|device| device.pilot.state = Some(false))
    }

    async fn query_state(&self) -> Result<Option<PilotState>, DeviceError> {
        self.pause(MockCall::Query(self.address)).await;
        let mut inner = self.network.inner.lock();
        let device = inner.device(self.address).ok_or_else(|| self.unreachable())?;
        if device.query_error {
            Err(DeviceError::Timeout(Duration::from_secs(1)))
        } else if device.silent_query {
            Ok(None)
        } else {
            Ok(Some(device.reported_pilot()))
        }
    }

    async fn close(&self) -> Result<(), DeviceError> {
        let mut inner = self.network.inner.lock();
        inner.calls.push(MockCall::Close(self.address));
        inner.closed.push(self.address);
        let fail = inner
            .device(self.address)
            .is_some_and(|device| device.close_error);
        if fail {
            Err(DeviceError::Other("mock close failed".to_string()))
        } else {
            Ok(())
        }
    }
}
