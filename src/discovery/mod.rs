// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery of lights on the local network.
//!
//! The sweep itself (broadcast, listen, collect replies) belongs to the
//! protocol implementation. The bridge only consumes its result: a list of
//! [`DiscoveryEntry`] per sweep, which the
//! [`Registry`](crate::registry::Registry) reconciles against the handles it
//! already holds.
//!
//! # Implementing a discovery service
//!
//! ```
//! use std::net::IpAddr;
//! use std::time::Duration;
//!
//! use wiz_bridge::command::LightCommand;
//! use wiz_bridge::device::{DeviceHandle, PilotState};
//! use wiz_bridge::discovery::{DiscoveryEntry, DiscoveryService};
//! use wiz_bridge::error::DeviceError;
//!
//! struct FixedLight(IpAddr);
//!
//! impl DeviceHandle for FixedLight {
//!     fn address(&self) -> IpAddr {
//!         self.0
//!     }
//!     async fn turn_on(&self, _: Option<&LightCommand>) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     async fn turn_off(&self) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//!     async fn query_state(&self) -> Result<Option<PilotState>, DeviceError> {
//!         Ok(Some(PilotState::new().with_state(true)))
//!     }
//!     async fn close(&self) -> Result<(), DeviceError> {
//!         Ok(())
//!     }
//! }
//!
//! struct FixedNetwork(Vec<IpAddr>);
//!
//! impl DiscoveryService for FixedNetwork {
//!     type Handle = FixedLight;
//!
//!     async fn discover(
//!         &self,
//!         _wait_time: Duration,
//!         _broadcast_address: &str,
//!     ) -> Result<Vec<DiscoveryEntry>, DeviceError> {
//!         Ok(self.0.iter().map(|ip| DiscoveryEntry::new(*ip)).collect())
//!     }
//!
//!     fn connect(&self, entry: &DiscoveryEntry) -> FixedLight {
//!         FixedLight(entry.address)
//!     }
//! }
//! ```

use std::net::IpAddr;
use std::time::Duration;

use crate::device::DeviceHandle;
use crate::error::DeviceError;
use crate::types::DeviceIdentity;

/// One light seen by one discovery sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEntry {
    /// Network address the light answered from.
    pub address: IpAddr,
    /// Hardware id, if the light announced one.
    pub identity: Option<DeviceIdentity>,
}

impl DiscoveryEntry {
    /// Creates an entry without identity.
    #[must_use]
    pub fn new(address: impl Into<IpAddr>) -> Self {
        Self {
            address: address.into(),
            identity: None,
        }
    }

    /// Sets the announced identity.
    #[must_use]
    pub fn with_identity(mut self, identity: DeviceIdentity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Locates lights and opens handles to them.
///
/// The service is moved onto the bridge's worker thread at start-up, hence
/// `Send`. The futures it returns and the handles it creates stay on that
/// thread.
#[allow(async_fn_in_trait)]
pub trait DiscoveryService: Send + 'static {
    /// Handle type opened for each discovered light.
    type Handle: DeviceHandle + 'static;

    /// Runs one sweep and returns every light that answered.
    ///
    /// # Arguments
    ///
    /// * `wait_time` - How long to listen for replies
    /// * `broadcast_address` - Where to send the discovery probe
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the sweep cannot be performed at all.
    async fn discover(
        &self,
        wait_time: Duration,
        broadcast_address: &str,
    ) -> Result<Vec<DiscoveryEntry>, DeviceError>;

    /// Opens a handle for a newly discovered light.
    ///
    /// Called at most once per address while that address stays
    /// discoverable.
    fn connect(&self, entry: &DiscoveryEntry) -> Self::Handle;
}
