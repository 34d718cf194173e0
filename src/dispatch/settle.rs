// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Join-all-settled: await every future, never short-circuit.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;

/// How a single future settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T> {
    /// The future ran to completion.
    Completed(T),
    /// The future panicked while being polled.
    Panicked(String),
}

/// Polls all `futures` concurrently until every one has settled.
///
/// Unlike `try_join_all`, a failure (an `Err` output or a panic) never
/// cancels the others. Results are returned in input order.
///
/// Every future is polled once before any is polled a second time, so work
/// each does before its first suspension point runs ahead of any
/// continuation.
pub async fn settle_all<I, F>(futures: I) -> Vec<Settlement<F::Output>>
where
    I: IntoIterator<Item = F>,
    F: Future,
{
    join_all(futures.into_iter().map(|fut| async move {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(value) => Settlement::Completed(value),
            Err(panic) => Settlement::Panicked(panic_message(&*panic)),
        }
    }))
    .await
}

/// Renders a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
