// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Act-then-query command execution.
//!
//! Every mutating operation sends its command, then immediately asks the
//! light for its state: what the light reports is what the caller sees. Any
//! failure along the way is folded into a [`StateUpdate`] carrying only the
//! error text, so these functions never fail.

use tracing::debug;

use crate::command::LightCommand;
use crate::device::DeviceHandle;
use crate::error::DeviceError;
use crate::state::StateUpdate;
use crate::types::PowerState;

fn failed(handle: &impl DeviceHandle, error: &DeviceError) -> StateUpdate {
    debug!(address = %handle.address(), %error, "Device operation failed");
    StateUpdate::failure(error.to_string())
}

/// Turns a light on or off, then reads back its state.
///
/// If the light acknowledges the read-back without reporting any state, the
/// power field is filled in from `on`.
pub async fn set_power<H: DeviceHandle>(handle: &H, on: bool) -> StateUpdate {
    let sent = if on {
        handle.turn_on(None).await
    } else {
        handle.turn_off().await
    };
    if let Err(error) = sent {
        return failed(handle, &error);
    }

    match handle.query_state().await {
        Ok(Some(pilot)) => StateUpdate::from_pilot(&pilot),
        Ok(None) => StateUpdate::new().with_power(PowerState::from(on)),
        Err(error) => failed(handle, &error),
    }
}

/// Turns a light on with `command` applied, then reads back its state.
pub async fn apply_command<H: DeviceHandle>(handle: &H, command: &LightCommand) -> StateUpdate {
    if let Err(error) = handle.turn_on(Some(command)).await {
        return failed(handle, &error);
    }
    refresh(handle).await
}

/// Reads the current state of a light.
pub async fn refresh<H: DeviceHandle>(handle: &H) -> StateUpdate {
    match handle.query_state().await {
        Ok(Some(pilot)) => StateUpdate::from_pilot(&pilot),
        Ok(None) => StateUpdate::new(),
        Err(error) => failed(handle, &error),
    }
}
