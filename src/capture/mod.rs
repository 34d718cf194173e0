// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seams to the packet capture backend.
//!
//! The library does not capture or decode packets itself. A backend (pcap,
//! `AF_PACKET`, a test double) implements [`CaptureFactory`] to open one
//! [`CaptureSession`] per network interface and pushes decoded [`Packet`]s
//! into the [`PacketSink`] it was given.
//!
//! ```text
//! backend thread ──► PacketSink::deliver(packet)
//!                           │
//!                     Dispatcher (one per interface)
//!                           │
//!               matching DashButton listeners
//! ```
//!
//! [`InterfaceDiscovery`] picks the interface for buttons that do not pin
//! one explicitly.

mod discovery;
mod packet;
mod sink;

pub use discovery::FixedInterface;
pub use packet::Packet;
pub use sink::PacketSink;

use crate::error::CaptureError;
use crate::types::InterfaceName;

/// Opens capture sessions on network interfaces.
///
/// The [`SessionPool`](crate::pool::SessionPool) calls
/// [`create_session`](Self::create_session) at most once per interface while
/// that interface is in use, under the pool lock.
pub trait CaptureFactory: Send + Sync {
    /// Opens a session on `interface` that delivers packets into `sink`.
    ///
    /// The sink may be called from any thread, including before this method
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError` if the session cannot be opened. The pool then
    /// leaves no trace of the attempt.
    fn create_session(
        &self,
        interface: &InterfaceName,
        sink: PacketSink,
    ) -> Result<Box<dyn CaptureSession>, CaptureError>;
}

/// A live capture session.
pub trait CaptureSession: Send {
    /// Stops capturing and releases the underlying handle.
    ///
    /// Called exactly once, when the last subscription on the interface is
    /// removed.
    fn close(&mut self);
}

/// Resolves the interface used when a button does not name one.
pub trait InterfaceDiscovery: Send + Sync {
    /// Returns the default capture interface.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::NoDefaultInterface` if none can be determined.
    fn default_interface(&self) -> Result<InterfaceName, CaptureError>;
}
