// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Applying one operation to several lights.
//!
//! Targets are processed one after another, in the order given, from the
//! calling thread. A failing target never stops the batch: its failure is
//! recorded and the runner moves on.
//!
//! # Examples
//!
//! ```
//! use wiz_bridge::batch::{run_batch, toggle_intent};
//! use wiz_bridge::state::{DeviceSnapshot, StateUpdate};
//! use wiz_bridge::types::PowerState;
//!
//! let mut lights = vec![
//!     DeviceSnapshot::new([10, 0, 0, 1], None),
//!     DeviceSnapshot::new([10, 0, 0, 2], None),
//! ];
//!
//! let turn_on = toggle_intent(&lights);
//! let outcome = run_batch(&mut lights, |light| {
//!     if light.address().to_string() == "10.0.0.2" {
//!         Ok(StateUpdate::failure("device at 10.0.0.2 is unreachable"))
//!     } else {
//!         Ok(StateUpdate::new().with_power(PowerState::from(turn_on)))
//!     }
//! });
//!
//! assert_eq!(outcome.success_count, 1);
//! assert_eq!(outcome.failures[0].label, "10.0.0.2");
//! assert!(lights[0].is_on());
//! ```

use std::net::IpAddr;

use tracing::debug;

use crate::error::Result;
use crate::state::{DeviceSnapshot, StateUpdate};

/// One target that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BatchFailure {
    /// Label of the target at the time of failure.
    pub label: String,
    /// Address of the target.
    pub address: IpAddr,
    /// What went wrong.
    pub message: String,
}

/// Tally of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatchOutcome {
    /// Number of targets whose operation succeeded.
    pub success_count: usize,
    /// Failed targets, in processing order.
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    /// Returns the number of targets processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.success_count + self.failures.len()
    }

    /// Returns true if no target failed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs `operation` against each target in order.
///
/// A returned [`StateUpdate`] is applied to its target whether it succeeded
/// or not. An `Err` (the call timed out, or the bridge is shut down) is
/// recorded as that target's failure and leaves the snapshot untouched.
pub fn run_batch<'a, I, F>(targets: I, mut operation: F) -> BatchOutcome
where
    I: IntoIterator<Item = &'a mut DeviceSnapshot>,
    F: FnMut(&DeviceSnapshot) -> Result<StateUpdate>,
{
    let mut outcome = BatchOutcome::default();

    for target in targets {
        let message = match operation(target) {
            Ok(update) => {
                update.apply(target);
                match target.last_error() {
                    None => {
                        outcome.success_count += 1;
                        continue;
                    }
                    Some(message) => message.to_string(),
                }
            }
            Err(error) => error.to_string(),
        };

        debug!(address = %target.address(), %message, "Batch target failed");
        outcome.failures.push(BatchFailure {
            label: target.label(),
            address: target.address(),
            message,
        });
    }

    outcome
}

/// Decides whether a power toggle over `targets` should turn them on.
///
/// Returns `false` only when at least one target has a known state and every
/// known state is on. Targets with unknown state are ignored.
#[must_use]
pub fn toggle_intent(targets: &[DeviceSnapshot]) -> bool {
    let mut known = targets.iter().filter_map(DeviceSnapshot::power).peekable();
    if known.peek().is_none() {
        return true;
    }
    !known.all(|power| power.is_on())
}
