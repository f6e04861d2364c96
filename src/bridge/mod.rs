// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocking front end to the background worker.
//!
//! A [`Bridge`] starts one worker thread when it is created. Every public
//! call packages its work, hands it to that thread, and blocks the caller
//! until the result arrives or the operation's time budget runs out.
//!
//! Only two things make a call fail: running out of time
//! ([`Error::Timeout`]) and calling a bridge that has been shut down
//! ([`Error::ShutDown`]). A light that misbehaves still produces an `Ok`
//! result, whose [`StateUpdate`] carries the error text.
//!
//! A timeout does not cancel anything. The work keeps running on the worker
//! and its outcome is thrown away, so a caller should treat a timed-out
//! command as having an unknown outcome.
//!
//! The bridge is designed for one foreground thread issuing one call at a
//! time.

mod config;
mod pending;
mod worker;

use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::LightCommand;
use crate::discovery::DiscoveryService;
use crate::error::{Error, Result};
use crate::executor;
use crate::state::{DeviceSnapshot, StateUpdate};
use crate::types::{Brightness, RgbColor, SceneId};

pub use config::{BridgeConfig, TimeoutPolicy};
pub use pending::Pending;
pub use worker::WorkerContext;

use worker::{Job, Message, WorkerThread};

/// Kind of work submitted to the bridge, used for budgets and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Discovery sweep and reconciliation.
    Discover,
    /// Power on/off.
    SetPower,
    /// Preset scene.
    SetPreset,
    /// Brightness change.
    SetBrightness,
    /// Color change.
    SetColor,
    /// State read-back.
    Refresh,
    /// Closing handles and stopping the worker.
    Shutdown,
    /// Caller-defined work.
    Task,
}

impl Operation {
    /// Returns the operation name as used in messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::SetPower => "set power",
            Self::SetPreset => "set preset",
            Self::SetBrightness => "set brightness",
            Self::SetColor => "set color",
            Self::Refresh => "refresh",
            Self::Shutdown => "shutdown",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`Bridge::shutdown`] managed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Handles closed cleanly.
    pub handles_closed: usize,
    /// Handles whose close failed.
    pub close_failures: usize,
    /// Whether the worker thread was joined within budget.
    pub worker_joined: bool,
}

/// Synchronous controller for a fleet of lights.
///
/// # Examples
///
/// ```
/// use std::net::IpAddr;
/// use wiz_bridge::bridge::{Bridge, BridgeConfig};
/// use wiz_bridge::mock::{MockDevice, MockNetwork};
/// use wiz_bridge::types::PowerState;
///
/// let network = MockNetwork::new()
///     .with_device(MockDevice::new([10, 0, 0, 2]))
///     .with_device(MockDevice::new([10, 0, 0, 1]));
///
/// let bridge = Bridge::start(network, BridgeConfig::new())?;
///
/// let mut lights = bridge.discover()?;
/// assert_eq!(lights[0].address(), IpAddr::from([10, 0, 0, 1]));
///
/// let update = bridge.set_power(lights[1].address(), true)?;
/// update.apply(&mut lights[1]);
/// assert_eq!(lights[1].power(), Some(PowerState::On));
///
/// bridge.shutdown();
/// # Ok::<(), wiz_bridge::Error>(())
/// ```
pub struct Bridge<D: DiscoveryService> {
    config: BridgeConfig,
    policy: TimeoutPolicy,
    sender: mpsc::UnboundedSender<Message<D>>,
    worker: Mutex<Option<WorkerThread>>,
    closed: AtomicBool,
}

impl<D: DiscoveryService> Bridge<D> {
    /// Starts the worker thread and returns a bridge serving `discovery`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the runtime or thread cannot
    /// be created.
    pub fn start(discovery: D, config: BridgeConfig) -> Result<Self> {
        let (sender, worker) = worker::spawn(discovery)?;
        let policy = config.policy();
        info!(
            broadcast = %config.broadcast_address,
            wait_ms = config.wait_time.as_millis(),
            "Bridge started"
        );
        Ok(Self {
            config,
            policy,
            sender,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the timeout policy.
    #[must_use]
    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // =========================================================================
    // Generic work
    // =========================================================================

    /// Schedules `work` on the worker thread without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`] after shutdown, or
    /// [`Error::WorkerUnavailable`] if the worker loop is gone.
    pub fn submit<T, F, Fut>(&self, operation: Operation, work: F) -> Result<Pending<T>>
    where
        F: FnOnce(WorkerContext<D>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + 'static,
        T: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(Error::ShutDown);
        }
        self.enqueue(operation, work)
    }

    /// Runs `work` on the worker thread and blocks until it finishes or
    /// `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the budget runs out (the work keeps
    /// running), [`Error::ShutDown`] after shutdown, or
    /// [`Error::Abandoned`] if the work panicked or the loop stopped.
    pub fn call_and_wait<T, F, Fut>(
        &self,
        operation: Operation,
        timeout: Duration,
        work: F,
    ) -> Result<T>
    where
        F: FnOnce(WorkerContext<D>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + 'static,
        T: Send + 'static,
    {
        let result = self.submit(operation, work)?.wait(timeout);
        if let Err(error @ Error::Timeout { .. }) = &result {
            warn!(%error, "Call gave up waiting; work continues in background");
        }
        result
    }

    fn enqueue<T, F, Fut>(&self, operation: Operation, work: F) -> Result<Pending<T>>
    where
        F: FnOnce(WorkerContext<D>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + 'static,
        T: Send + 'static,
    {
        let (completer, pending) = pending::channel(operation);
        let job: Job<D> = Box::new(move |context| {
            Box::pin(async move {
                completer.complete(work(context).await);
            }) as Pin<Box<dyn Future<Output = ()>>>
        });
        self.sender
            .send(Message::Run(job))
            .map_err(|_| Error::WorkerUnavailable("worker loop has stopped".to_string()))?;
        Ok(pending)
    }

    // =========================================================================
    // Fleet operations
    // =========================================================================

    /// Runs one discovery sweep and reconciles the registry with it.
    ///
    /// Returns one snapshot per light found, sorted by address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the sweep itself fails, plus the
    /// errors of [`call_and_wait`](Self::call_and_wait).
    pub fn discover(&self) -> Result<Vec<DeviceSnapshot>> {
        let wait_time = self.config.wait_time;
        let broadcast = self.config.broadcast_address.clone();

        self.call_and_wait(
            Operation::Discover,
            self.policy.discovery(),
            move |context| async move {
                debug!(%broadcast, "Starting discovery sweep");
                let entries = context
                    .discovery()
                    .discover(wait_time, &broadcast)
                    .await
                    .map_err(Error::Discovery)?;
                let snapshots = context
                    .registry()
                    .reconcile(entries, |entry| context.discovery().connect(entry))
                    .await;
                Ok::<_, Error>(snapshots)
            },
        )?
    }

    /// Returns the addresses currently registered, ascending.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn registered_addresses(&self) -> Result<Vec<IpAddr>> {
        self.call_and_wait(Operation::Task, self.policy.command(), |context| async move {
            context.registry().addresses()
        })
    }

    /// Turns a light on or off.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn set_power(&self, address: IpAddr, on: bool) -> Result<StateUpdate> {
        self.run_on_device(Operation::SetPower, address, move |handle| async move {
            executor::set_power(&*handle, on).await
        })
    }

    /// Switches a light to a preset scene.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn set_preset(&self, address: IpAddr, scene: SceneId) -> Result<StateUpdate> {
        self.apply(Operation::SetPreset, address, LightCommand::scene(scene))
    }

    /// Sets a light's brightness.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn set_brightness(&self, address: IpAddr, brightness: Brightness) -> Result<StateUpdate> {
        self.apply(
            Operation::SetBrightness,
            address,
            LightCommand::brightness(brightness),
        )
    }

    /// Sets a light's color.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn set_color(&self, address: IpAddr, color: RgbColor) -> Result<StateUpdate> {
        self.apply(Operation::SetColor, address, LightCommand::color(color))
    }

    /// Reads a light's current state.
    ///
    /// # Errors
    ///
    /// Same as [`call_and_wait`](Self::call_and_wait).
    pub fn refresh(&self, address: IpAddr) -> Result<StateUpdate> {
        self.run_on_device(Operation::Refresh, address, |handle| async move {
            executor::refresh(&*handle).await
        })
    }

    fn apply(&self, operation: Operation, address: IpAddr, command: LightCommand) -> Result<StateUpdate> {
        self.run_on_device(operation, address, move |handle| async move {
            executor::apply_command(&*handle, &command).await
        })
    }

    fn run_on_device<F, Fut>(&self, operation: Operation, address: IpAddr, action: F) -> Result<StateUpdate>
    where
        F: FnOnce(Rc<D::Handle>) -> Fut + Send + 'static,
        Fut: Future<Output = StateUpdate> + 'static,
    {
        self.call_and_wait(
            operation,
            self.policy.budget(operation),
            move |context| async move {
                let Some(handle) = context.registry().handle(address) else {
                    debug!(%address, %operation, "No device registered");
                    return StateUpdate::failure(format!("no device registered at {address}"));
                };
                debug!(%address, %operation, "Running device operation");
                let mut update = action(handle).await;
                context.registry().settle_identity(address, &mut update);
                update
            },
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Closes every handle, stops the worker loop and joins its thread.
    ///
    /// Each phase is bounded by the shutdown budget; overruns are logged and
    /// the bridge moves on. After this call every operation fails with
    /// [`Error::ShutDown`]. Calling it again does nothing and returns an
    /// empty report.
    pub fn shutdown(&self) -> ShutdownReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return ShutdownReport::default();
        }

        let budget = self.policy.shutdown();
        let mut report = ShutdownReport::default();
        info!("Shutting down bridge");

        let closing = self.enqueue(Operation::Shutdown, |context| async move {
            context.registry().close_all().await
        });
        match closing.and_then(|pending| pending.wait(budget)) {
            Ok(summary) => {
                report.handles_closed = summary.closed;
                report.close_failures = summary.failures;
            }
            Err(error) => warn!(%error, "Device handles were not all closed"),
        }

        if self.sender.send(Message::Stop).is_err() {
            debug!("Worker loop already stopped");
        }
        if let Some(worker) = self.worker.lock().take() {
            report.worker_joined = worker.join(budget);
        }

        info!(
            closed = report.handles_closed,
            failures = report.close_failures,
            joined = report.worker_joined,
            "Bridge shut down"
        );
        report
    }
}

impl<D: DiscoveryService> fmt::Debug for Bridge<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl<D: DiscoveryService> Drop for Bridge<D> {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Bridge dropped without shutdown, stopping worker");
            // The thread is detached; handles are dropped without closing.
            if self.sender.send(Message::Stop).is_err() {
                debug!("Worker loop already stopped");
            }
        }
    }
}
