// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The background worker thread.
//!
//! One OS thread runs a current-thread tokio runtime with a `LocalSet`. Jobs
//! arrive over an unbounded channel and are spawned as local tasks in
//! arrival order, so they start in submission order and interleave at
//! `.await` points. The registry and every device handle live here and
//! nowhere else.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing::{debug, info, warn};

use crate::discovery::DiscoveryService;
use crate::error::{Error, Result};
use crate::registry::Registry;

use super::Operation;
use super::pending::{self, Pending};

const THREAD_NAME: &str = "wiz-bridge-worker";

pub(crate) type Job<D> =
    Box<dyn FnOnce(WorkerContext<D>) -> Pin<Box<dyn Future<Output = ()>>> + Send>;

pub(crate) enum Message<D: DiscoveryService> {
    Run(Job<D>),
    Stop,
}

/// What a unit of work can reach on the worker thread.
pub struct WorkerContext<D: DiscoveryService> {
    registry: Rc<Registry<D::Handle>>,
    discovery: Rc<D>,
}

impl<D: DiscoveryService> Clone for WorkerContext<D> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            discovery: Rc::clone(&self.discovery),
        }
    }
}

impl<D: DiscoveryService> WorkerContext<D> {
    /// Returns the device registry.
    #[must_use]
    pub fn registry(&self) -> &Registry<D::Handle> {
        &self.registry
    }

    /// Returns the discovery service.
    #[must_use]
    pub fn discovery(&self) -> &D {
        &self.discovery
    }
}

/// Join handle plus the signal the thread raises once its loop has ended.
pub(crate) struct WorkerThread {
    thread: JoinHandle<()>,
    exited: Pending<()>,
}

impl WorkerThread {
    /// Waits up to `budget` for the loop to end, then joins the thread.
    ///
    /// Returns false if the thread had to be detached or panicked.
    pub(crate) fn join(self, budget: Duration) -> bool {
        match self.exited.wait(budget) {
            Ok(()) | Err(Error::Abandoned(_)) => {
                if self.thread.join().is_ok() {
                    debug!("Worker thread joined");
                    true
                } else {
                    warn!("Worker thread panicked");
                    false
                }
            }
            Err(error) => {
                warn!(%error, "Worker thread did not stop in time, detaching");
                false
            }
        }
    }
}

/// Starts the worker thread.
pub(crate) fn spawn<D: DiscoveryService>(
    discovery: D,
) -> Result<(mpsc::UnboundedSender<Message<D>>, WorkerThread)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::WorkerUnavailable(format!("failed to build runtime: {e}")))?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let (exit_signal, exited) = pending::channel(Operation::Shutdown);

    let thread = std::thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || {
            run(&runtime, receiver, discovery);
            exit_signal.complete(());
        })
        .map_err(|e| Error::WorkerUnavailable(format!("failed to spawn {THREAD_NAME}: {e}")))?;

    Ok((sender, WorkerThread { thread, exited }))
}

fn run<D: DiscoveryService>(
    runtime: &Runtime,
    mut receiver: mpsc::UnboundedReceiver<Message<D>>,
    discovery: D,
) {
    let context = WorkerContext {
        registry: Rc::new(Registry::new()),
        discovery: Rc::new(discovery),
    };
    let local = LocalSet::new();

    local.block_on(runtime, async move {
        info!("Bridge worker started");
        while let Some(message) = receiver.recv().await {
            match message {
                Message::Run(job) => {
                    tokio::task::spawn_local(job(context.clone()));
                }
                Message::Stop => break,
            }
        }
        info!("Bridge worker stopped");
    });

    // Dropping the set cancels work still in flight; its waiters see
    // `Error::Abandoned`.
    drop(local);
}
