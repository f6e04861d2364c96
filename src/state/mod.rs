// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Foreground-visible light state.
//!
//! A [`DeviceSnapshot`] is the caller's copy of what is known about one
//! light. Every bridge call returns a [`StateUpdate`] describing what the
//! operation observed; applying it to the snapshot brings the copy up to
//! date. Neither type holds a connection, so both move freely between
//! threads.
//!
//! # Examples
//!
//! ```
//! use wiz_bridge::state::{DeviceSnapshot, StateUpdate};
//! use wiz_bridge::types::{Brightness, PowerState};
//!
//! let mut light = DeviceSnapshot::new([192, 168, 1, 20], None);
//!
//! let update = StateUpdate::new()
//!     .with_power(PowerState::On)
//!     .with_brightness(Brightness::new(80).unwrap());
//! update.apply(&mut light);
//!
//! assert_eq!(light.power(), Some(PowerState::On));
//! assert_eq!(light.brightness().map(|b| b.value()), Some(80));
//! assert!(light.last_error().is_none());
//! ```

mod snapshot;
mod update;

pub use snapshot::DeviceSnapshot;
pub use update::StateUpdate;
