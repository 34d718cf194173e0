// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized delivery of button presses to listeners.
//!
//! Each capture session owns one [`Dispatcher`]. For every packet it either
//! starts a batch (all listeners of all matching buttons, started together)
//! or drops the packet because the previous batch has not settled yet.
//!
//! Batches are awaited with [`settle_all`], which waits for every listener
//! regardless of individual failures.

mod dispatcher;
mod settle;

pub(crate) use dispatcher::RouteId;
pub use dispatcher::{DispatchOutcome, DispatchState, Dispatcher};
pub use settle::{Settlement, settle_all};
