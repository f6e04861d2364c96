// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot result slot shared between the worker and a blocking caller.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

use super::Operation;

enum SlotState<T> {
    Waiting,
    Done(T),
    Abandoned,
    Taken,
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Slot<T> {
    fn settle(&self, next: SlotState<T>) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Waiting) {
            *state = next;
        }
        drop(state);
        self.ready.notify_all();
    }
}

/// Creates a connected completer/pending pair for `operation`.
pub(crate) fn channel<T>(operation: Operation) -> (Completer<T>, Pending<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Waiting),
        ready: Condvar::new(),
    });
    (
        Completer {
            slot: Some(Arc::clone(&slot)),
        },
        Pending { slot, operation },
    )
}

/// Worker side of a [`Pending`].
///
/// Dropping it without calling [`complete`](Self::complete) wakes the waiter
/// with [`Error::Abandoned`].
pub(crate) struct Completer<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, value: T) {
        if let Some(slot) = self.slot.take() {
            slot.settle(SlotState::Done(value));
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.settle(SlotState::Abandoned);
        }
    }
}

/// Result of a unit of work submitted to the bridge.
///
/// Dropping a `Pending` discards the result; the work itself keeps running.
pub struct Pending<T> {
    slot: Arc<Slot<T>>,
    operation: Operation,
}

impl<T> Pending<T> {
    /// Returns the operation this result belongs to.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns true once the result is available or the work was abandoned.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(*self.slot.state.lock(), SlotState::Waiting)
    }

    /// Takes the result if it is available, without blocking.
    ///
    /// Returns `None` while the work is still running.
    pub fn try_take(&self) -> Option<Result<T>> {
        let mut state = self.slot.state.lock();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Waiting => {
                *state = SlotState::Waiting;
                None
            }
            SlotState::Done(value) => Some(Ok(value)),
            SlotState::Abandoned | SlotState::Taken => Some(Err(Error::Abandoned(self.operation))),
        }
    }

    /// Blocks until the result is available or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the budget runs out. The work is not
    /// cancelled and its eventual result is dropped. Returns
    /// [`Error::Abandoned`] if the worker dropped the work without finishing
    /// it.
    pub fn wait(self, timeout: Duration) -> Result<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.slot.state.lock();

        while matches!(*state, SlotState::Waiting) {
            match deadline {
                Some(deadline) => {
                    if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.slot.ready.wait(&mut state),
            }
        }

        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Done(value) => Ok(value),
            SlotState::Waiting => {
                *state = SlotState::Waiting;
                Err(Error::Timeout {
                    operation: self.operation,
                    after: timeout,
                })
            }
            SlotState::Abandoned | SlotState::Taken => Err(Error::Abandoned(self.operation)),
        }
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("operation", &self.operation)
            .field("ready", &self.is_ready())
            .finish()
    }
}
