// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static interface discovery.

use crate::error::CaptureError;
use crate::types::InterfaceName;

use super::InterfaceDiscovery;

/// Discovery that always answers with a preconfigured interface.
///
/// Used when the default interface comes from configuration rather than
/// from probing the host. An empty `FixedInterface` reports
/// [`CaptureError::NoDefaultInterface`].
///
/// # Examples
///
/// ```
/// use dash_button::capture::{FixedInterface, InterfaceDiscovery};
/// use dash_button::types::InterfaceName;
///
/// let discovery = FixedInterface::new(InterfaceName::new("en0").unwrap());
/// assert_eq!(discovery.default_interface().unwrap().as_str(), "en0");
///
/// assert!(FixedInterface::none().default_interface().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixedInterface(Option<InterfaceName>);

impl FixedInterface {
    /// Always resolves to `interface`.
    #[must_use]
    pub fn new(interface: InterfaceName) -> Self {
        Self(Some(interface))
    }

    /// Never resolves; buttons must pin their interface.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }
}

impl InterfaceDiscovery for FixedInterface {
    fn default_interface(&self) -> Result<InterfaceName, CaptureError> {
        self.0.clone().ok_or(CaptureError::NoDefaultInterface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_resolves() {
        let iface = InterfaceName::new("wlan0").unwrap();
        let discovery = FixedInterface::new(iface.clone());
        assert_eq!(discovery.default_interface().unwrap(), iface);
    }

    #[test]
    fn none_reports_missing_default() {
        assert_eq!(
            FixedInterface::none().default_interface(),
            Err(CaptureError::NoDefaultInterface)
        );
        assert_eq!(
            FixedInterface::default().default_interface(),
            Err(CaptureError::NoDefaultInterface)
        );
    }
}
