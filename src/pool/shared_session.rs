// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A capture session shared by every button on one interface.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::capture::CaptureSession;
use crate::dispatch::Dispatcher;
use crate::types::InterfaceName;

/// A live capture session and the dispatcher fed by it.
///
/// Owned by the [`SessionPool`](super::SessionPool); buttons hold an `Arc`
/// only to reach the dispatcher. The backend handle is closed by the pool
/// when the reference count drops to zero.
pub struct SharedSession {
    interface: InterfaceName,
    dispatcher: Arc<Dispatcher>,
    handle: Mutex<Option<Box<dyn CaptureSession>>>,
}

impl SharedSession {
    pub(crate) fn new(
        interface: InterfaceName,
        dispatcher: Arc<Dispatcher>,
        handle: Box<dyn CaptureSession>,
    ) -> Self {
        Self {
            interface,
            dispatcher,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// The interface this session captures on.
    #[must_use]
    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }

    /// The dispatcher receiving this session's packets.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns `true` until the session has been closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Closes the backend handle and stops routing.
    ///
    /// Returns `false` if the session was already closed.
    pub(crate) fn close(&self) -> bool {
        let Some(mut handle) = self.handle.lock().take() else {
            return false;
        };
        self.dispatcher.close();
        handle.close();
        true
    }
}

impl fmt::Debug for SharedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSession")
            .field("interface", &self.interface)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
