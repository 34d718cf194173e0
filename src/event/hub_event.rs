// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lifecycle and diagnostic events emitted by a session pool.

use serde::Serialize;

use crate::types::{InterfaceName, MacAddress};

/// Events published on a pool's [`EventBus`](super::EventBus).
///
/// These make otherwise silent behavior observable: session creation and
/// teardown, packets discarded because a batch was still running, and
/// listener failures that the dispatcher swallows.
///
/// # Examples
///
/// ```
/// use dash_button::event::HubEvent;
/// use dash_button::types::InterfaceName;
///
/// let iface = InterfaceName::new("en0").unwrap();
/// let opened = HubEvent::SessionOpened { interface: iface.clone() };
///
/// assert_eq!(opened.interface(), &iface);
/// assert!(opened.is_lifecycle());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    /// A capture session was created for an interface.
    SessionOpened {
        /// The interface the session listens on.
        interface: InterfaceName,
    },

    /// A capture session was closed after its last subscription went away.
    SessionClosed {
        /// The interface the session listened on.
        interface: InterfaceName,
    },

    /// A packet arrived while a batch was in flight and was discarded.
    PacketDropped {
        /// The interface the packet was captured on.
        interface: InterfaceName,
        /// Source address of the dropped packet, if known.
        source: Option<MacAddress>,
    },

    /// A listener panicked or returned an error.
    ListenerFailed {
        /// The interface of the batch.
        interface: InterfaceName,
        /// The button whose listener failed.
        mac: MacAddress,
        /// Rendered error or panic message.
        error: String,
    },

    /// Every listener of a batch has completed.
    BatchSettled {
        /// The interface of the batch.
        interface: InterfaceName,
        /// Number of listener invocations in the batch.
        listeners: usize,
        /// How many of them failed.
        failures: usize,
    },
}

impl HubEvent {
    /// Returns the interface associated with this event.
    #[must_use]
    pub fn interface(&self) -> &InterfaceName {
        match self {
            Self::SessionOpened { interface }
            | Self::SessionClosed { interface }
            | Self::PacketDropped { interface, .. }
            | Self::ListenerFailed { interface, .. }
            | Self::BatchSettled { interface, .. } => interface,
        }
    }

    /// Returns `true` for session open/close events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::SessionOpened { .. } | Self::SessionClosed { .. }
        )
    }

    /// Returns `true` if this event reports a listener failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ListenerFailed { .. })
    }
}
