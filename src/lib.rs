// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `wiz_bridge` - Drive a fleet of network lights from synchronous code.
//!
//! Device I/O is asynchronous and slow; interactive front ends usually are
//! not. This crate sits in between: a [`Bridge`] owns one background worker
//! thread that runs every device operation, keeps a registry of live
//! connections in step with repeated discovery sweeps, and offers a plain
//! blocking API where every call is bounded by a timeout.
//!
//! # Features
//!
//! - **Blocking calls, async devices**: each call hands its work to the
//!   worker thread and waits for the result within a per-operation budget
//! - **Reconciled registry**: lights that vanish are closed, new ones are
//!   connected, learned hardware ids are never overwritten
//! - **Errors as data**: a light that fails yields a [`StateUpdate`] with an
//!   error message, so batches report partial success instead of aborting
//! - **Sequential batches**: [`batch::run_batch`] applies one operation to many
//!   lights in order and tallies the outcome
//!
//! The wire protocol and the network sweep are supplied by the caller through
//! the [`DeviceHandle`] and [`DiscoveryService`] traits. The [`mock`] module
//! provides an in-memory implementation of both.
//!
//! # Quick Start
//!
//! ```
//! use wiz_bridge::batch::{run_batch, toggle_intent};
//! use wiz_bridge::mock::{MockDevice, MockNetwork};
//! use wiz_bridge::{Bridge, BridgeConfig, Brightness};
//!
//! let network = MockNetwork::new()
//!     .with_device(MockDevice::new([192, 168, 1, 31]).with_identity("a8bb50e1c2d3"))
//!     .with_device(MockDevice::new([192, 168, 1, 30]));
//!
//! let bridge = Bridge::start(network, BridgeConfig::new())?;
//!
//! // Snapshots come back sorted by address
//! let mut lights = bridge.discover()?;
//! assert_eq!(lights[1].label(), "a8bb50e1c2d3");
//!
//! // One light
//! let update = bridge.set_brightness(lights[0].address(), Brightness::new(200)?)?;
//! update.apply(&mut lights[0]);
//!
//! // All lights
//! let turn_on = toggle_intent(&lights);
//! let outcome = run_batch(&mut lights, |light| bridge.set_power(light.address(), turn_on));
//! assert!(outcome.is_complete_success());
//! assert!(lights.iter().all(|light| light.is_on()));
//!
//! bridge.shutdown();
//! # Ok::<(), wiz_bridge::Error>(())
//! ```

pub mod batch;
pub mod bridge;
pub mod command;
pub mod device;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod mock;
pub mod registry;
pub mod state;
pub mod types;

pub use batch::{BatchFailure, BatchOutcome};
pub use bridge::{Bridge, BridgeConfig, Operation, Pending, ShutdownReport, TimeoutPolicy};
pub use command::LightCommand;
pub use device::{DeviceHandle, PilotState};
pub use discovery::{DiscoveryEntry, DiscoveryService};
pub use error::{DeviceError, Error, Result, ValueError};
pub use state::{DeviceSnapshot, StateUpdate};
pub use types::{Brightness, DeviceIdentity, PowerState, RgbColor, SceneId};
