// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for light control.
//!
//! Each type is valid by construction, so callers validate user input once
//! (for example rejecting a brightness of 400) and the bridge passes the
//! value through unchanged.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off
//! - [`Brightness`] - Brightness level (0-255)
//! - [`RgbColor`] - Three 8-bit color channels
//! - [`SceneId`] - Built-in preset scene number
//! - [`DeviceIdentity`] - Stable hardware id (MAC)

mod brightness;
mod identity;
mod power;
mod rgb_color;
mod scene;

pub use brightness::Brightness;
pub use identity::DeviceIdentity;
pub use power::PowerState;
pub use rgb_color::RgbColor;
pub use scene::SceneId;
