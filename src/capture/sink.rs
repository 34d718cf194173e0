// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry point for packets coming from a capture backend.

use std::sync::{Arc, Weak};

use crate::dispatch::{DispatchOutcome, Dispatcher};

use super::Packet;

/// Handle a capture backend uses to hand packets to the library.
///
/// Cheap to clone and safe to call from any thread. It holds only a weak
/// reference to its dispatcher, so a backend that outlives its session
/// sees [`DispatchOutcome::Closed`] instead of keeping the session alive.
#[derive(Debug, Clone)]
pub struct PacketSink {
    dispatcher: Weak<Dispatcher>,
}

impl PacketSink {
    pub(crate) fn new(dispatcher: &Arc<Dispatcher>) -> Self {
        Self {
            dispatcher: Arc::downgrade(dispatcher),
        }
    }

    /// Delivers one packet to the session's dispatcher.
    pub fn deliver(&self, packet: Packet) -> DispatchOutcome {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.dispatch(&packet),
            None => DispatchOutcome::Closed,
        }
    }

    /// Waits until the batch in flight, if any, has settled.
    ///
    /// Returns immediately once the session is gone.
    pub async fn settled(&self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.settled().await;
        }
    }

    /// Returns `true` while the session this sink feeds is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.dispatcher
            .upgrade()
            .is_some_and(|dispatcher| !dispatcher.is_closed())
    }
}
