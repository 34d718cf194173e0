// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network interface name type.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Name of a network interface a capture session listens on (e.g. `en0`).
///
/// Interface names key the [`SessionPool`](crate::pool::SessionPool): all
/// buttons on the same interface share one capture session. The name is
/// immutable and cheap to clone.
///
/// # Examples
///
/// ```
/// use dash_button::types::InterfaceName;
///
/// let iface = InterfaceName::new("en0").unwrap();
/// assert_eq!(iface.as_str(), "en0");
///
/// assert!(InterfaceName::new("").is_err());
/// assert!(InterfaceName::new("en 0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(Arc<str>);

impl InterfaceName {
    /// Creates a validated interface name.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidInterfaceName` if the name is empty or
    /// contains whitespace, `/` or control characters.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValueError> {
        let name = name.as_ref();
        let forbidden = |c: char| c.is_whitespace() || c.is_control() || c == '/';
        if name.is_empty() || name.chars().any(forbidden) {
            return Err(ValueError::InvalidInterfaceName(name.to_string()));
        }
        Ok(Self(Arc::from(name)))
    }

    /// Returns the interface name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for InterfaceName {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InterfaceName> for String {
    fn from(value: InterfaceName) -> Self {
        value.0.to_string()
    }
}
