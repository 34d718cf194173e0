// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized packet dispatch for one capture session.
//!
//! # Architecture
//!
//! ```text
//! PacketSink::deliver(packet)
//!            ↓
//!   Dispatcher::dispatch()  ── Dispatching? ──► dropped
//!            ↓ Idle
//!   routes matching packet.source()
//!            ↓
//!   Weak<ListenerRegistry>.upgrade().snapshot()
//!            ↓
//!   start every listener (sync part runs inline)
//!            ↓
//!   spawn: settle_all(futures) ──► report failures ──► Idle
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use futures::future;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::capture::Packet;
use crate::event::{ButtonPress, EventBus, HubEvent};
use crate::subscription::ListenerRegistry;
use crate::subscription::ListenerFuture;
use crate::subscription::listener::Listener;
use crate::types::{InterfaceName, MacAddress};

use super::settle::{Settlement, panic_message, settle_all};

/// Whether a dispatcher is free to accept the next packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No batch in flight.
    Idle,
    /// A batch has started and not yet settled.
    Dispatching,
}

/// What happened to a delivered packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A batch was started with this many listener invocations.
    Dispatched {
        /// Number of listeners started.
        listeners: usize,
    },
    /// No listener matched; the empty batch settled immediately.
    Unmatched,
    /// A batch was still in flight, so the packet was discarded.
    Dropped,
    /// The session has been closed.
    Closed,
}

/// Identifies one button's route within a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RouteId(u64);

struct Route {
    mac: MacAddress,
    listeners: Weak<ListenerRegistry>,
}

/// Resets the state to idle when the batch ends, however it ends.
struct BatchGuard {
    state: Arc<watch::Sender<DispatchState>>,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.state.send_replace(DispatchState::Idle);
    }
}

/// Routes packets from one capture session to button listeners.
///
/// At most one batch is in flight per dispatcher. A packet that arrives while
/// a batch is running is dropped, not queued: bursts collapse to the first
/// packet after listeners are free.
///
/// Routes hold weak references, so a dropped button simply stops matching.
pub struct Dispatcher {
    interface: InterfaceName,
    routes: RwLock<BTreeMap<RouteId, Route>>,
    next_route: AtomicU64,
    state: Arc<watch::Sender<DispatchState>>,
    closed: AtomicBool,
    runtime: Handle,
    events: EventBus,
}

impl Dispatcher {
    pub(crate) fn new(interface: InterfaceName, runtime: Handle, events: EventBus) -> Self {
        let (state, _) = watch::channel(DispatchState::Idle);
        Self {
            interface,
            routes: RwLock::new(BTreeMap::new()),
            next_route: AtomicU64::new(1),
            state: Arc::new(state),
            closed: AtomicBool::new(false),
            runtime,
            events,
        }
    }

    /// The interface this dispatcher serves.
    #[must_use]
    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }

    /// Adds a route for packets from `mac` to `listeners`.
    pub(crate) fn register(&self, mac: MacAddress, listeners: &Arc<ListenerRegistry>) -> RouteId {
        let id = RouteId(self.next_route.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(interface = %self.interface, mac = %mac, "Registering button route");
        self.routes.write().insert(
            id,
            Route {
                mac,
                listeners: Arc::downgrade(listeners),
            },
        );
        id
    }

    /// Removes a route. Returns `true` if it was present.
    pub(crate) fn unregister(&self, id: RouteId) -> bool {
        let removed = self.routes.write().remove(&id);
        if let Some(route) = &removed {
            tracing::debug!(interface = %self.interface, mac = %route.mac, "Unregistering button route");
        }
        removed.is_some()
    }

    /// Stops accepting packets and drops every route.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.routes.write().clear();
    }

    /// Returns `true` once the owning session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns the current dispatch state.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        *self.state.borrow()
    }

    /// Returns `true` while a batch is in flight.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.state() == DispatchState::Dispatching
    }

    /// Waits until no batch is in flight.
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|state| *state == DispatchState::Idle).await;
    }

    /// Dispatches one packet.
    ///
    /// If idle, every listener of every button matching the packet's source
    /// is started before this returns; their synchronous parts run inline in
    /// registration order. The asynchronous remainder is awaited on the
    /// runtime, and the dispatcher becomes idle again once all of them have
    /// settled, successfully or not.
    pub fn dispatch(&self, packet: &Packet) -> DispatchOutcome {
        if self.is_closed() {
            return DispatchOutcome::Closed;
        }

        let claimed = self.state.send_if_modified(|state| {
            if *state == DispatchState::Idle {
                *state = DispatchState::Dispatching;
                true
            } else {
                false
            }
        });
        if !claimed {
            tracing::trace!(
                interface = %self.interface,
                source = ?packet.source(),
                "Dropping packet while batch is in flight"
            );
            self.events.publish(HubEvent::PacketDropped {
                interface: self.interface.clone(),
                source: packet.source(),
            });
            return DispatchOutcome::Dropped;
        }
        let guard = BatchGuard {
            state: Arc::clone(&self.state),
        };

        let Some(source) = packet.source() else {
            tracing::trace!(interface = %self.interface, "Ignoring unattributed packet");
            return DispatchOutcome::Unmatched;
        };

        let listeners = self.snapshot_for(source);
        if listeners.is_empty() {
            tracing::trace!(interface = %self.interface, source = %source, "No button registered for packet");
            return DispatchOutcome::Unmatched;
        }

        let press = ButtonPress::new(source, self.interface.clone(), packet.captured_at());
        let count = listeners.len();
        let pending: Vec<ListenerFuture> = listeners
            .iter()
            .map(|listener| start_listener(listener, press.clone()))
            .collect();

        tracing::debug!(interface = %self.interface, mac = %source, listeners = count, "Dispatching button press");

        let interface = self.interface.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let results = settle_all(pending).await;
            let failures = report_failures(&interface, source, results, &events);
            events.publish(HubEvent::BatchSettled {
                interface,
                listeners: count,
                failures,
            });
            drop(guard);
        });

        DispatchOutcome::Dispatched { listeners: count }
    }

    /// Collects listeners of all live routes for `mac`, in route order.
    fn snapshot_for(&self, mac: MacAddress) -> Vec<Listener> {
        let routes = self.routes.read();
        routes
            .values()
            .filter(|route| route.mac == mac)
            .filter_map(|route| route.listeners.upgrade())
            .flat_map(|registry| registry.snapshot())
            .collect()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("interface", &self.interface)
            .field("state", &self.state())
            .field("route_count", &self.route_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Runs a listener's synchronous part, turning a panic into a failed future.
fn start_listener(listener: &Listener, press: ButtonPress) -> ListenerFuture {
    match std::panic::catch_unwind(AssertUnwindSafe(|| listener(press))) {
        Ok(fut) => fut,
        Err(panic) => {
            let message = panic_message(&*panic);
            future::ready(Err(message.into())).boxed()
        }
    }
}

/// Logs and publishes failed settlements. Returns how many failed.
fn report_failures(
    interface: &InterfaceName,
    mac: MacAddress,
    results: Vec<Settlement<Result<(), crate::subscription::ListenerError>>>,
    events: &EventBus,
) -> usize {
    let mut failures = 0;
    for result in results {
        let error = match result {
            Settlement::Completed(Ok(())) => continue,
            Settlement::Completed(Err(err)) => err.to_string(),
            Settlement::Panicked(message) => format!("panicked: {message}"),
        };
        failures += 1;
        tracing::warn!(interface = %interface, mac = %mac, error = %error, "Button listener failed");
        events.publish(HubEvent::ListenerFailed {
            interface: interface.clone(),
            mac,
            error,
        });
    }
    failures
}
