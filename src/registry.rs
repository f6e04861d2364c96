// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Address-keyed registry of live device handles.
//!
//! The registry lives on the bridge's worker thread and is only ever touched
//! from there, so it uses a plain `RefCell` rather than a lock. Borrows are
//! never held across an `.await`: every async step first clones the handle
//! out (`Rc<H>`) and releases the borrow.
//!
//! Once [`Registry::close_all`] has run the registry is closed: a sweep
//! still in flight at that point connects nothing.
//!
//! Entries are kept in a `BTreeMap`, which makes every listing sorted by
//! address (IPv4 before IPv6, numeric within each family).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::device::DeviceHandle;
use crate::discovery::DiscoveryEntry;
use crate::executor;
use crate::state::{DeviceSnapshot, StateUpdate};
use crate::types::DeviceIdentity;

struct RegisteredDevice<H> {
    handle: Rc<H>,
    identity: Option<DeviceIdentity>,
}

/// Outcome of closing every handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    /// Handles that closed cleanly.
    pub closed: usize,
    /// Handles whose close reported an error.
    pub failures: usize,
}

/// Live handles keyed by network address.
pub struct Registry<H> {
    entries: RefCell<BTreeMap<IpAddr, RegisteredDevice<H>>>,
    closed: Cell<bool>,
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            closed: Cell::new(false),
        }
    }
}

impl<H> std::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("addresses", &self.addresses())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<H> Registry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if no handle is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns true if a handle is registered at `address`.
    #[must_use]
    pub fn contains(&self, address: IpAddr) -> bool {
        self.entries.borrow().contains_key(&address)
    }

    /// Returns true once [`close_all`](Self::close_all) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Returns every registered address, ascending.
    #[must_use]
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.entries.borrow().keys().copied().collect()
    }

    /// Returns the learned identity of the handle at `address`.
    #[must_use]
    pub fn identity(&self, address: IpAddr) -> Option<DeviceIdentity> {
        self.entries
            .borrow()
            .get(&address)
            .and_then(|entry| entry.identity.clone())
    }

    /// Returns the handle at `address`.
    #[must_use]
    pub fn handle(&self, address: IpAddr) -> Option<Rc<H>> {
        self.entries
            .borrow()
            .get(&address)
            .map(|entry| Rc::clone(&entry.handle))
    }

    /// Records `identity` for `address` unless one is already known.
    ///
    /// Returns true if the identity was adopted.
    pub fn adopt_identity(&self, address: IpAddr, identity: Option<&DeviceIdentity>) -> bool {
        let Some(identity) = identity else {
            return false;
        };
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(&address) {
            Some(entry) if entry.identity.is_none() => {
                debug!(%address, %identity, "Learned device identity");
                entry.identity = Some(identity.clone());
                true
            }
            _ => false,
        }
    }

    /// Reconciles a successful update's identity with the registry.
    ///
    /// The reported identity is adopted if none is stored yet, then the
    /// update is rewritten to carry the stored identity. Failed updates are
    /// left untouched so they keep carrying the error alone.
    pub fn settle_identity(&self, address: IpAddr, update: &mut StateUpdate) {
        if !update.is_success() || !self.contains(address) {
            return;
        }
        self.adopt_identity(address, update.identity());
        update.replace_identity(self.identity(address));
    }
}

impl<H: DeviceHandle> Registry<H> {
    /// Brings the registry in line with one discovery sweep.
    ///
    /// Handles for addresses missing from `entries` are removed and closed;
    /// close failures are logged and otherwise ignored. New addresses get a
    /// handle from `connect`. Every address in the sweep is then queried in
    /// turn and reported as a snapshot, sorted by address.
    ///
    /// When the same address appears more than once, the last entry wins.
    /// A closed registry connects nothing and returns no snapshots.
    pub async fn reconcile<F>(&self, entries: Vec<DiscoveryEntry>, mut connect: F) -> Vec<DeviceSnapshot>
    where
        F: FnMut(&DiscoveryEntry) -> H,
    {
        let found: BTreeMap<IpAddr, DiscoveryEntry> = entries
            .into_iter()
            .map(|entry| (entry.address, entry))
            .collect();

        let stale: Vec<(IpAddr, Rc<H>)> = {
            let mut registered = self.entries.borrow_mut();
            let gone: Vec<IpAddr> = registered
                .keys()
                .filter(|address| !found.contains_key(address))
                .copied()
                .collect();
            gone.into_iter()
                .filter_map(|address| {
                    registered
                        .remove(&address)
                        .map(|entry| (address, entry.handle))
                })
                .collect()
        };

        for (address, handle) in stale {
            info!(%address, "Device no longer discovered, closing handle");
            if let Err(error) = handle.close().await {
                warn!(%address, %error, "Failed to close stale handle");
            }
        }

        if self.is_closed() {
            info!(found = found.len(), "Registry closed, dropping discovery results");
            return Vec::new();
        }

        for entry in found.values() {
            let created = {
                let mut registered = self.entries.borrow_mut();
                if registered.contains_key(&entry.address) {
                    false
                } else {
                    registered.insert(
                        entry.address,
                        RegisteredDevice {
                            handle: Rc::new(connect(entry)),
                            identity: entry.identity.clone(),
                        },
                    );
                    true
                }
            };
            if created {
                debug!(address = %entry.address, "Registered new device");
            } else {
                self.adopt_identity(entry.address, entry.identity.as_ref());
            }
        }

        let mut snapshots = Vec::with_capacity(found.len());
        for &address in found.keys() {
            let Some(handle) = self.handle(address) else {
                continue;
            };
            let mut update = executor::refresh(&*handle).await;
            self.settle_identity(address, &mut update);
            snapshots.push(DeviceSnapshot::from_update(
                address,
                self.identity(address),
                &update,
            ));
        }

        info!(count = snapshots.len(), "Discovery reconciled");
        snapshots
    }

    /// Removes and closes every handle, then refuses new ones.
    pub async fn close_all(&self) -> CloseSummary {
        self.closed.set(true);
        let drained: Vec<(IpAddr, Rc<H>)> = std::mem::take(&mut *self.entries.borrow_mut())
            .into_iter()
            .map(|(address, entry)| (address, entry.handle))
            .collect();

        let mut summary = CloseSummary::default();
        for (address, handle) in drained {
            match handle.close().await {
                Ok(()) => summary.closed += 1,
                Err(error) => {
                    warn!(%address, %error, "Failed to close handle");
                    summary.failures += 1;
                }
            }
        }
        summary
    }
}
