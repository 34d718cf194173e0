// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `dash_button` - React to Amazon Dash button presses.
//!
//! A Dash button joins the network and announces itself every time it is
//! pressed. This library turns those announcements, seen by a packet capture
//! backend, into calls to listeners registered per button.
//!
//! # Features
//!
//! - **Shared capture sessions**: all buttons on one interface share a single
//!   session, opened on the first listener and closed after the last
//! - **Serialized delivery**: a press is only dispatched once every listener
//!   of the previous press has finished; presses arriving in between are
//!   dropped
//! - **Fault isolation**: a listener that panics or fails never affects the
//!   other listeners
//! - **Idempotent unsubscription**: [`Subscription::remove`] can be called any
//!   number of times
//!
//! Packet capture itself is left to a backend implementing
//! [`capture::CaptureFactory`].
//!
//! # Quick Start
//!
//! ```no_run
//! use dash_button::{DashButton, SessionPool};
//! use dash_button::types::InterfaceName;
//! # use dash_button::capture::{CaptureFactory, CaptureSession, PacketSink};
//! # struct Pcap;
//! # impl CaptureFactory for Pcap {
//! #     fn create_session(&self, _: &InterfaceName, _: PacketSink)
//! #         -> Result<Box<dyn CaptureSession>, dash_button::CaptureError> { unimplemented!() }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> dash_button::Result<()> {
//!     let pool = SessionPool::builder(Pcap)
//!         .default_interface(InterfaceName::new("en0")?)
//!         .build()?;
//!
//!     let button = DashButton::new("00:11:22:33:44:55".parse()?, &pool);
//!
//!     let subscription = button.add_listener(|press| async move {
//!         println!("{} pressed", press.mac());
//!         Ok::<_, std::io::Error>(())
//!     })?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
//!     subscription.remove();
//!     Ok(())
//! }
//! ```

mod button;
pub mod capture;
mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod pool;
pub mod subscription;
pub mod types;

pub use button::DashButton;
pub use config::HubConfig;
pub use error::{CaptureError, Error, Result, ValueError};
pub use event::{ButtonPress, EventBus, HubEvent};
pub use pool::{SessionPool, SessionPoolBuilder};
pub use subscription::{Subscription, SubscriptionId};
pub use types::{InterfaceName, MacAddress};
