// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! Each type validates its input at construction time, so a value that
//! exists is always well-formed.
//!
//! # Types
//!
//! - [`MacAddress`] - Hardware address identifying a button
//! - [`InterfaceName`] - Network interface a capture session listens on

mod interface;
mod mac_address;

pub use interface::InterfaceName;
pub use mac_address::MacAddress;
