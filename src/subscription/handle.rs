// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription handle returned by [`DashButton::add_listener`](crate::DashButton::add_listener).

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::button::ButtonShared;
use crate::types::MacAddress;

use super::SubscriptionId;

/// Binds one listener to one button.
///
/// Dropping a `Subscription` does not remove the listener; call
/// [`remove`](Self::remove). When the last listener of a button is removed
/// the button stops routing packets, and when the last button on an
/// interface does so, the capture session is closed.
///
/// A subscription keeps its button alive.
pub struct Subscription {
    button: Arc<ButtonShared>,
    id: SubscriptionId,
    removed: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(button: Arc<ButtonShared>, id: SubscriptionId) -> Self {
        Self {
            button,
            id,
            removed: AtomicBool::new(false),
        }
    }

    /// Detaches the listener.
    ///
    /// Only the first call has an effect; later calls return immediately.
    /// A listener invocation already in flight is not interrupted.
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.button.detach(self.id);
    }

    /// Returns `true` once [`remove`](Self::remove) has been called.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// The listener's identifier within its button.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Hardware address of the button this subscription belongs to.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.button.mac()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("mac", &self.button.mac())
            .field("id", &self.id)
            .field("removed", &self.is_removed())
            .finish()
    }
}
