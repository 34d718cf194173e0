// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pool configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::DEFAULT_CHANNEL_CAPACITY;
use crate::types::InterfaceName;

/// Settings for a [`SessionPool`](crate::pool::SessionPool).
///
/// Every field has a default, so partial documents are accepted.
///
/// # Examples
///
/// ```
/// use dash_button::HubConfig;
///
/// let config = HubConfig::from_json(r#"{ "default_interface": "en0" }"#).unwrap();
/// assert_eq!(config.default_interface.as_ref().unwrap().as_str(), "en0");
/// assert_eq!(config.event_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Interface used by buttons that do not name one.
    ///
    /// Takes the place of interface discovery when set.
    pub default_interface: Option<InterfaceName>,

    /// Buffer size of the pool's event bus.
    pub event_capacity: usize,
}

impl HubConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed or the interface
    /// name is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the default interface.
    #[must_use]
    pub fn with_default_interface(mut self, interface: InterfaceName) -> Self {
        self.default_interface = Some(interface);
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            default_interface: None,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
