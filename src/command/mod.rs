// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light commands.
//!
//! A [`LightCommand`] is the optional payload of
//! [`DeviceHandle::turn_on`](crate::device::DeviceHandle::turn_on). Encoding
//! it for the wire is the handle's job.
//!
//! | Bridge call | Command |
//! |-------------|---------|
//! | `set_preset` | [`LightCommand::scene`] |
//! | `set_brightness` | [`LightCommand::brightness`] |
//! | `set_color` | [`LightCommand::color`] |
//!
//! Power on/off uses no command at all.

mod light;

pub use light::LightCommand;
