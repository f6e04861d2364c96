// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Only two kinds of failure ever reach a foreground caller as an `Err`:
//! a call that ran out of its time budget, and a call made against a bridge
//! whose worker is gone. Everything a light itself does wrong is carried as
//! data inside a [`StateUpdate`](crate::state::StateUpdate) instead.

use std::time::Duration;

use thiserror::Error;

use crate::bridge::Operation;

/// The main error type for foreground calls.
#[derive(Debug, Error)]
pub enum Error {
    /// The call exceeded its time budget.
    ///
    /// The unit of work keeps running on the worker; its outcome is unknown
    /// to the caller.
    #[error("{operation} timed out after {} ms", after.as_millis())]
    Timeout {
        /// The operation that timed out.
        operation: Operation,
        /// The budget that was exceeded.
        after: Duration,
    },

    /// The bridge has been shut down.
    #[error("bridge has been shut down")]
    ShutDown,

    /// The unit of work was dropped before producing a result.
    ///
    /// This happens when the worker loop stops with the work still in
    /// flight, or when the work panicked.
    #[error("{0} was abandoned before completing")]
    Abandoned(Operation),

    /// The worker thread could not be started or is no longer running.
    #[error("worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// The discovery sweep itself failed.
    #[error("discovery failed: {0}")]
    Discovery(#[source] DeviceError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

/// Errors reported by device handles and the discovery service.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device did not answer.
    #[error("device at {0} is unreachable")]
    Unreachable(String),

    /// The device answered but refused the command.
    #[error("command rejected: {0}")]
    Rejected(String),

    /// The transport gave up waiting for a reply.
    #[error("no reply after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The handle was used after being closed.
    #[error("connection is closed")]
    Closed,

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else the collaborator wants to report.
    #[error("{0}")]
    Other(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A hardware identity was empty or malformed.
    #[error("invalid device identity: {0:?}")]
    InvalidIdentity(String),

    /// A scene id was zero or not a number.
    #[error("invalid scene id: {0}")]
    InvalidScene(String),

    /// A power state string was not recognized.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
