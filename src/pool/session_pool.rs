// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference-counted capture session pooling.
//!
//! All buttons on the same interface share a single capture session. The
//! session is opened on the first acquire and closed on the last release.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::button::DashButton;
use crate::capture::{CaptureFactory, FixedInterface, InterfaceDiscovery, PacketSink};
use crate::config::HubConfig;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::event::{EventBus, HubEvent};
use crate::types::{InterfaceName, MacAddress};

use super::SharedSession;

struct PoolEntry {
    session: Arc<SharedSession>,
    ref_count: usize,
}

struct PoolInner {
    factory: Arc<dyn CaptureFactory>,
    discovery: Arc<dyn InterfaceDiscovery>,
    /// Every ref-count change happens under this lock.
    sessions: Mutex<HashMap<InterfaceName, PoolEntry>>,
    events: EventBus,
    runtime: Handle,
}

/// Pool of capture sessions, one per interface.
///
/// The pool is an ordinary value rather than a process-wide singleton:
/// independent pools never share sessions, which keeps tests isolated.
/// `SessionPool` is cheaply cloneable; clones share state.
///
/// # Examples
///
/// ```no_run
/// use dash_button::SessionPool;
/// use dash_button::types::InterfaceName;
/// # use dash_button::capture::{CaptureFactory, CaptureSession, PacketSink};
/// # struct Pcap;
/// # impl CaptureFactory for Pcap {
/// #     fn create_session(&self, _: &InterfaceName, _: PacketSink)
/// #         -> Result<Box<dyn CaptureSession>, dash_button::CaptureError> { unimplemented!() }
/// # }
///
/// # async fn example() -> dash_button::Result<()> {
/// let pool = SessionPool::builder(Pcap)
///     .default_interface(InterfaceName::new("en0")?)
///     .build()?;
///
/// let button = pool.button("00:11:22:33:44:55".parse()?);
/// let subscription = button.add_callback(|press| println!("{} pressed", press.mac()))?;
/// assert_eq!(pool.session_count(), 1);
///
/// subscription.remove();
/// assert_eq!(pool.session_count(), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

impl SessionPool {
    /// Creates a builder around the given capture backend.
    #[must_use]
    pub fn builder(factory: impl CaptureFactory + 'static) -> SessionPoolBuilder {
        SessionPoolBuilder::new(Arc::new(factory))
    }

    /// Creates a button bound to this pool.
    ///
    /// No session is opened until the button's first listener is added.
    #[must_use]
    pub fn button(&self, mac: MacAddress) -> DashButton {
        DashButton::new(mac, self)
    }

    /// Resolves the interface for a button.
    ///
    /// A pinned interface is returned as is; otherwise interface discovery
    /// is consulted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Capture` if discovery cannot find a default.
    pub(crate) fn resolve_interface(&self, pinned: Option<&InterfaceName>) -> Result<InterfaceName> {
        match pinned {
            Some(interface) => Ok(interface.clone()),
            None => Ok(self.inner.discovery.default_interface()?),
        }
    }

    /// Takes a reference to the session for `interface`, opening it if needed.
    ///
    /// Concurrent callers never open two sessions for the same interface.
    ///
    /// # Errors
    ///
    /// Returns `Error::Capture` if the backend fails to open the session. In
    /// that case no reference is taken.
    pub(crate) fn acquire(&self, interface: &InterfaceName) -> Result<Arc<SharedSession>> {
        let mut sessions = self.inner.sessions.lock();

        if let Some(entry) = sessions.get_mut(interface) {
            entry.ref_count += 1;
            tracing::debug!(
                interface = %interface,
                ref_count = entry.ref_count,
                "Reusing existing capture session"
            );
            return Ok(Arc::clone(&entry.session));
        }

        tracing::debug!(interface = %interface, "Opening capture session");
        let dispatcher = Arc::new(Dispatcher::new(
            interface.clone(),
            self.inner.runtime.clone(),
            self.inner.events.clone(),
        ));
        let sink = PacketSink::new(&dispatcher);
        let handle = self
            .inner
            .factory
            .create_session(interface, sink)
            .inspect_err(|err| {
                tracing::warn!(interface = %interface, error = %err, "Failed to open capture session");
            })?;

        let session = Arc::new(SharedSession::new(interface.clone(), dispatcher, handle));
        sessions.insert(
            interface.clone(),
            PoolEntry {
                session: Arc::clone(&session),
                ref_count: 1,
            },
        );
        drop(sessions);

        self.inner.events.publish(HubEvent::SessionOpened {
            interface: interface.clone(),
        });
        Ok(session)
    }

    /// Gives back one reference to the session for `interface`.
    ///
    /// The session is closed before this returns when the last reference is
    /// released. Returns `true` in that case.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotAcquired` if no reference is held. This
    /// means the caller released more often than it acquired.
    pub(crate) fn release(&self, interface: &InterfaceName) -> Result<bool> {
        let mut sessions = self.inner.sessions.lock();

        let Some(entry) = sessions.get_mut(interface) else {
            tracing::error!(interface = %interface, "Release of a capture session that is not held");
            return Err(Error::SessionNotAcquired(interface.clone()));
        };

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            tracing::debug!(
                interface = %interface,
                ref_count = entry.ref_count,
                "Released capture session reference"
            );
            return Ok(false);
        }

        if let Some(entry) = sessions.remove(interface) {
            tracing::debug!(interface = %interface, "Closing capture session");
            entry.session.close();
        }
        drop(sessions);

        self.inner.events.publish(HubEvent::SessionClosed {
            interface: interface.clone(),
        });
        Ok(true)
    }

    /// Returns the number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    /// Returns how many references are held on `interface`'s session.
    #[must_use]
    pub fn ref_count(&self, interface: &InterfaceName) -> usize {
        self.inner
            .sessions
            .lock()
            .get(interface)
            .map_or(0, |entry| entry.ref_count)
    }

    /// Returns the open session for `interface`, if any.
    #[must_use]
    pub fn session(&self, interface: &InterfaceName) -> Option<Arc<SharedSession>> {
        self.inner
            .sessions
            .lock()
            .get(interface)
            .map(|entry| Arc::clone(&entry.session))
    }

    /// The bus on which this pool publishes [`HubEvent`]s.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }
}

impl fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool")
            .field("session_count", &self.session_count())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`SessionPool`].
pub struct SessionPoolBuilder {
    factory: Arc<dyn CaptureFactory>,
    discovery: Option<Arc<dyn InterfaceDiscovery>>,
    config: HubConfig,
    runtime: Option<Handle>,
}

impl SessionPoolBuilder {
    fn new(factory: Arc<dyn CaptureFactory>) -> Self {
        Self {
            factory,
            discovery: None,
            config: HubConfig::default(),
            runtime: None,
        }
    }

    /// Uses `discovery` to resolve the default interface.
    ///
    /// Takes precedence over a configured default interface.
    #[must_use]
    pub fn discovery(mut self, discovery: impl InterfaceDiscovery + 'static) -> Self {
        self.discovery = Some(Arc::new(discovery));
        self
    }

    /// Uses a fixed default interface.
    #[must_use]
    pub fn default_interface(mut self, interface: InterfaceName) -> Self {
        self.config.default_interface = Some(interface);
        self
    }

    /// Applies a configuration.
    #[must_use]
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Sets the runtime that drives listener batches.
    ///
    /// Defaults to the runtime `build` is called from.
    ///
    /// Backends usually deliver packets from their own threads, and each
    /// batch is spawned onto this runtime. The runtime must therefore keep
    /// running while the pool is in use: a multi-thread runtime, or a
    /// current-thread runtime some thread is blocked on. If nothing drives it,
    /// the first batch never settles and every later packet is dropped.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the pool.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoRuntime` if no runtime was given and `build` is not
    /// called from within a tokio runtime.
    pub fn build(self) -> Result<SessionPool> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        let discovery = self.discovery.unwrap_or_else(|| {
            let fixed = self
                .config
                .default_interface
                .map_or_else(FixedInterface::none, FixedInterface::new);
            Arc::new(fixed)
        });

        Ok(SessionPool {
            inner: Arc::new(PoolInner {
                factory: self.factory,
                discovery,
                sessions: Mutex::new(HashMap::new()),
                events: EventBus::with_capacity(self.config.event_capacity),
                runtime,
            }),
        })
    }
}

impl fmt::Debug for SessionPoolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPoolBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
