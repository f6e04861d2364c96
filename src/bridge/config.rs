// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration and timeout budgets.

use std::time::Duration;

use super::Operation;

/// Configuration for a [`Bridge`](super::Bridge).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wiz_bridge::bridge::BridgeConfig;
///
/// let config = BridgeConfig::new()
///     .with_broadcast_address("192.168.1.255")
///     .with_wait_time(Duration::from_secs(8));
///
/// // Discovery gets the wait time plus a grace period
/// assert_eq!(config.policy().discovery(), Duration::from_secs(10));
/// assert_eq!(config.policy().command(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address discovery probes are sent to.
    pub broadcast_address: String,
    /// How long each discovery sweep listens for replies.
    pub wait_time: Duration,
    /// Lower bound on the discovery budget.
    pub min_discovery_timeout: Duration,
    /// Added to `wait_time` to form the discovery budget.
    pub discovery_grace: Duration,
    /// Budget for every command and refresh.
    pub command_timeout: Duration,
    /// Budget for each of the two shutdown phases.
    pub shutdown_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            broadcast_address: "255.255.255.255".to_string(),
            wait_time: Duration::from_secs(5),
            min_discovery_timeout: Duration::from_secs(5),
            discovery_grace: Duration::from_secs(2),
            command_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl BridgeConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the broadcast address.
    #[must_use]
    pub fn with_broadcast_address(mut self, address: impl Into<String>) -> Self {
        self.broadcast_address = address.into();
        self
    }

    /// Sets the discovery wait time.
    #[must_use]
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Sets the minimum discovery budget.
    #[must_use]
    pub fn with_min_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.min_discovery_timeout = timeout;
        self
    }

    /// Sets the discovery grace period.
    #[must_use]
    pub fn with_discovery_grace(mut self, grace: Duration) -> Self {
        self.discovery_grace = grace;
        self
    }

    /// Sets the command budget.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the shutdown budget.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Returns the timeout policy derived from this configuration.
    #[must_use]
    pub fn policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            discovery: self
                .min_discovery_timeout
                .max(self.wait_time.saturating_add(self.discovery_grace)),
            command: self.command_timeout,
            shutdown: self.shutdown_timeout,
        }
    }
}

/// Per-operation time budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    discovery: Duration,
    command: Duration,
    shutdown: Duration,
}

impl TimeoutPolicy {
    /// Budget for one discovery call.
    #[must_use]
    pub fn discovery(&self) -> Duration {
        self.discovery
    }

    /// Budget for one command or refresh.
    #[must_use]
    pub fn command(&self) -> Duration {
        self.command
    }

    /// Budget for each shutdown phase.
    #[must_use]
    pub fn shutdown(&self) -> Duration {
        self.shutdown
    }

    /// Returns the budget for `operation`.
    #[must_use]
    pub fn budget(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Discover => self.discovery,
            Operation::Shutdown => self.shutdown,
            Operation::SetPower
            | Operation::SetPreset
            | Operation::SetBrightness
            | Operation::SetColor
            | Operation::Refresh
            | Operation::Task => self.command,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        BridgeConfig::default().policy()
    }
}
