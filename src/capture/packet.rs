// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate events emitted by a capture backend.

use chrono::{DateTime, Utc};

use crate::types::MacAddress;

/// A captured packet, already decoded by the backend.
///
/// Backends extract the sender hardware address (for Dash buttons, the ARP
/// probe's source MAC) before handing the packet over. A packet the backend
/// could not attribute carries no source and matches no button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    source: Option<MacAddress>,
    captured_at: DateTime<Utc>,
}

impl Packet {
    /// Creates a packet sent by `source`, stamped with the current time.
    #[must_use]
    pub fn from_source(source: MacAddress) -> Self {
        Self::new(Some(source), Utc::now())
    }

    /// Creates a packet whose sender is unknown.
    #[must_use]
    pub fn unattributed() -> Self {
        Self::new(None, Utc::now())
    }

    /// Creates a packet with an explicit capture timestamp.
    #[must_use]
    pub fn new(source: Option<MacAddress>, captured_at: DateTime<Utc>) -> Self {
        Self {
            source,
            captured_at,
        }
    }

    /// Sender hardware address, if the backend could extract one.
    #[must_use]
    pub fn source(&self) -> Option<MacAddress> {
        self.source
    }

    /// When the backend captured the packet.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
