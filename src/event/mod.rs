// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events produced by the library.
//!
//! Two kinds of events flow out of a session pool:
//!
//! - [`ButtonPress`] - handed to the listeners of the pressed button
//! - [`HubEvent`] - diagnostics broadcast on the pool's [`EventBus`]
//!
//! # Examples
//!
//! ```
//! use dash_button::event::{EventBus, HubEvent};
//! use dash_button::types::InterfaceName;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let interface = InterfaceName::new("en0").unwrap();
//! bus.publish(HubEvent::SessionClosed { interface });
//! ```

mod button_press;
mod event_bus;
mod hub_event;

pub use button_press::ButtonPress;
pub(crate) use event_bus::DEFAULT_CHANNEL_CAPACITY;
pub use event_bus::EventBus;
pub use hub_event::HubEvent;
