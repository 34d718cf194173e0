// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener callback types.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::event::ButtonPress;

/// Error a listener may fail with.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Future returned by a started listener.
pub type ListenerFuture = BoxFuture<'static, Result<(), ListenerError>>;

/// A type-erased listener.
///
/// Calling it runs the listener's synchronous part immediately and returns
/// the remainder as a future.
pub(crate) type Listener = Arc<dyn Fn(ButtonPress) -> ListenerFuture + Send + Sync>;

/// Wraps an async listener.
pub(crate) fn from_async<F, Fut, E>(listener: F) -> Listener
where
    F: Fn(ButtonPress) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<ListenerError>,
{
    Arc::new(move |press| listener(press).map(|res| res.map_err(Into::into)).boxed())
}

/// Wraps a plain synchronous callback.
pub(crate) fn from_callback<F>(callback: F) -> Listener
where
    F: Fn(ButtonPress) + Send + Sync + 'static,
{
    Arc::new(move |press| {
        callback(press);
        future::ready(Ok(())).boxed()
    })
}
