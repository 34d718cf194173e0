// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capture session pooling.
//!
//! Opening a capture session is expensive, so buttons on the same interface
//! share one. The [`SessionPool`] counts references per interface, opens the
//! session on the 0→1 transition and closes it on 1→0.

mod session_pool;
mod shared_session;

pub use session_pool::{SessionPool, SessionPoolBuilder};
pub use shared_session::SharedSession;
