// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener registration.
//!
//! - [`SubscriptionId`] - identifies one registered listener, in registration
//!   order within its button
//! - [`Subscription`] - caller-owned handle whose [`remove`](Subscription::remove)
//!   detaches the listener and, when it was the last one, releases the
//!   capture session
//!
//! Listeners are either plain callbacks or functions returning a future.
//! Both may fail; failures are isolated from other listeners.
//!
//! ```no_run
//! # use dash_button::{DashButton, SessionPool};
//! # fn example(pool: &SessionPool) -> dash_button::Result<()> {
//! let button = DashButton::new("00:11:22:33:44:55".parse()?, pool);
//!
//! let subscription = button.add_callback(|press| {
//!     println!("{} pressed", press.mac());
//! })?;
//!
//! subscription.remove();
//! subscription.remove(); // no-op
//! # Ok(())
//! # }
//! ```

mod handle;
pub(crate) mod listener;
mod registry;

pub use handle::Subscription;
pub use listener::{ListenerError, ListenerFuture};
pub(crate) use registry::ListenerRegistry;
pub use registry::SubscriptionId;
