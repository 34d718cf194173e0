// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The event handed to button listeners.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{InterfaceName, MacAddress};

/// A detected press of a Dash button.
///
/// One `ButtonPress` is built per dispatched packet and cloned into every
/// listener of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonPress {
    mac: MacAddress,
    interface: InterfaceName,
    detected_at: DateTime<Utc>,
}

impl ButtonPress {
    /// Creates a press event for the given button.
    #[must_use]
    pub fn new(mac: MacAddress, interface: InterfaceName, detected_at: DateTime<Utc>) -> Self {
        Self {
            mac,
            interface,
            detected_at,
        }
    }

    /// Hardware address of the button that was pressed.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Interface the packet was captured on.
    #[must_use]
    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }

    /// When the packet reached the dispatcher.
    #[must_use]
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }
}
