// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-button listener storage.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::listener::Listener;

/// Unique identifier for a registered listener.
///
/// IDs are allocated in increasing order within a registry, so ordering by
/// ID is registration order. Registering the same closure twice yields two
/// distinct IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Ordered set of listeners for one button.
///
/// Entries are keyed by [`SubscriptionId`] rather than by callback identity,
/// which keeps duplicate callbacks independent and makes removal exact.
/// Dispatch works from [`snapshot`](Self::snapshot), so changes made while a
/// batch runs only affect later batches.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<BTreeMap<SubscriptionId, Listener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(BTreeMap::new()),
        }
    }

    /// Appends a listener.
    pub(crate) fn add(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().insert(id, listener);
        id
    }

    /// Removes a listener.
    ///
    /// Returns the number of listeners left, or `None` if `id` was not
    /// registered (already removed, or never added here).
    pub(crate) fn remove(&self, id: SubscriptionId) -> Option<usize> {
        let mut listeners = self.listeners.write();
        listeners.remove(&id).map(|_| listeners.len())
    }

    /// Copies the current listeners in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Listener> {
        self.listeners.read().values().cloned().collect()
    }

    /// Returns the number of registered listeners.
    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listener_count", &self.len())
            .finish()
    }
}
