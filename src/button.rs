// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-button façade.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatch::RouteId;
use crate::error::Result;
use crate::event::ButtonPress;
use crate::pool::{SessionPool, SharedSession};
use crate::subscription::listener::{self, Listener};
use crate::subscription::{ListenerError, ListenerRegistry, Subscription, SubscriptionId};
use crate::types::{InterfaceName, MacAddress};

/// A Dash button, identified by its hardware address.
///
/// Creating a button has no side effects. The first
/// [`add_listener`](Self::add_listener) opens (or joins) the capture session
/// for the button's interface; removing the last listener leaves it again.
///
/// Clones share listeners and session membership.
///
/// # Examples
///
/// ```no_run
/// # use dash_button::{DashButton, SessionPool};
/// # async fn example(pool: SessionPool) -> dash_button::Result<()> {
/// let button = DashButton::new("00:11:22:33:44:55".parse()?, &pool);
///
/// let subscription = button.add_listener(|press| async move {
///     println!("pressed at {}", press.detected_at());
///     Ok::<_, std::io::Error>(())
/// })?;
///
/// subscription.remove();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DashButton {
    inner: Arc<ButtonShared>,
}

impl DashButton {
    /// Creates a button on the pool's default interface.
    #[must_use]
    pub fn new(mac: MacAddress, pool: &SessionPool) -> Self {
        Self::with_interface(mac, None, pool)
    }

    /// Creates a button listening on a specific interface.
    #[must_use]
    pub fn on_interface(mac: MacAddress, interface: InterfaceName, pool: &SessionPool) -> Self {
        Self::with_interface(mac, Some(interface), pool)
    }

    fn with_interface(mac: MacAddress, interface: Option<InterfaceName>, pool: &SessionPool) -> Self {
        Self {
            inner: Arc::new(ButtonShared {
                mac,
                interface,
                pool: pool.clone(),
                listeners: Arc::new(ListenerRegistry::new()),
                attachment: Mutex::new(None),
            }),
        }
    }

    /// Hardware address of this button.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.inner.mac
    }

    /// The interface in use, once a listener is attached.
    ///
    /// Falls back to the pinned interface, if any, while detached.
    #[must_use]
    pub fn interface(&self) -> Option<InterfaceName> {
        let attachment = self.inner.attachment.lock();
        match attachment.as_ref() {
            Some(attachment) => Some(attachment.session.interface().clone()),
            None => self.inner.interface.clone(),
        }
    }

    /// Returns `true` while the button holds a capture session reference.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.attachment.lock().is_some()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Adds an async listener.
    ///
    /// The closure runs synchronously when a press is dispatched; the future
    /// it returns is then awaited together with every other listener of the
    /// same press. A returned error or a panic is logged and published as
    /// [`HubEvent::ListenerFailed`](crate::event::HubEvent::ListenerFailed);
    /// it never affects other listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if this is the first listener and the interface
    /// cannot be resolved or the capture session cannot be opened. Nothing is
    /// registered in that case.
    pub fn add_listener<F, Fut, E>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn(ButtonPress) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Into<ListenerError>,
    {
        self.inner.attach(listener::from_async(listener))
    }

    /// Adds a plain synchronous callback.
    ///
    /// # Errors
    ///
    /// Same as [`add_listener`](Self::add_listener).
    pub fn add_callback<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(ButtonPress) + Send + Sync + 'static,
    {
        self.inner.attach(listener::from_callback(callback))
    }
}

impl fmt::Debug for DashButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashButton")
            .field("mac", &self.inner.mac)
            .field("listener_count", &self.listener_count())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Membership of a button in a capture session.
struct Attachment {
    session: Arc<SharedSession>,
    route: RouteId,
}

/// State shared by a button's clones and its subscriptions.
pub(crate) struct ButtonShared {
    mac: MacAddress,
    interface: Option<InterfaceName>,
    pool: SessionPool,
    listeners: Arc<ListenerRegistry>,
    /// Held while listeners are added or removed, so attach and detach of
    /// the session never interleave.
    attachment: Mutex<Option<Attachment>>,
}

impl ButtonShared {
    pub(crate) fn mac(&self) -> MacAddress {
        self.mac
    }

    fn attach(self: &Arc<Self>, listener: Listener) -> Result<Subscription> {
        let mut attachment = self.attachment.lock();

        // A closed session no longer holds this button's reference
        if let Some(stale) = attachment.take_if(|held| !held.session.is_open()) {
            tracing::warn!(
                mac = %self.mac,
                interface = %stale.session.interface(),
                "Capture session closed while attached"
            );
            stale.session.dispatcher().unregister(stale.route);
        }

        if attachment.is_none() {
            let interface = self.pool.resolve_interface(self.interface.as_ref())?;
            let session = self.pool.acquire(&interface)?;
            let route = session.dispatcher().register(self.mac, &self.listeners);
            *attachment = Some(Attachment { session, route });
        }

        let id = self.listeners.add(listener);
        tracing::debug!(mac = %self.mac, subscription = %id, "Added button listener");
        Ok(Subscription::new(Arc::clone(self), id))
    }

    pub(crate) fn detach(&self, id: SubscriptionId) {
        let mut attachment = self.attachment.lock();

        let Some(remaining) = self.listeners.remove(id) else {
            return;
        };
        tracing::debug!(mac = %self.mac, subscription = %id, remaining, "Removed button listener");

        if remaining == 0
            && let Some(attachment) = attachment.take()
        {
            self.leave(attachment);
        }
    }

    fn leave(&self, attachment: Attachment) {
        let Attachment { session, route } = attachment;
        session.dispatcher().unregister(route);
        if let Err(err) = self.pool.release(session.interface()) {
            tracing::error!(mac = %self.mac, error = %err, "Failed to release capture session");
        }
    }
}

impl Drop for ButtonShared {
    fn drop(&mut self) {
        // Last handle gone with listeners still registered
        if let Some(attachment) = self.attachment.get_mut().take() {
            self.leave(attachment);
        }
    }
}
