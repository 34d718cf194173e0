// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `dash_button` library.
//!
//! This module provides the error hierarchy for the library: value
//! validation, capture backend failures, and internal bookkeeping errors.
//!
//! Listener failures are deliberately absent: a failing listener never
//! surfaces as an [`Error`]. It is logged and published on the
//! [`EventBus`](crate::event::EventBus) instead.

use thiserror::Error;

use crate::types::InterfaceName;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The capture backend failed.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    /// A session was released more times than it was acquired.
    ///
    /// This indicates a bookkeeping bug inside the library, not a caller error.
    #[error("no capture session is held for interface {0}")]
    SessionNotAcquired(InterfaceName),

    /// The pool was built outside a tokio runtime and no handle was supplied.
    #[error("no tokio runtime available to drive listener batches")]
    NoRuntime,

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A MAC address string could not be parsed.
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),

    /// An interface name is empty or contains forbidden characters.
    #[error("invalid interface name: {0:?}")]
    InvalidInterfaceName(String),
}

/// Errors reported by a capture backend or interface discovery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The backend could not open a capture session.
    #[error("failed to open capture session on {interface}: {reason}")]
    OpenFailed {
        /// The interface the session was requested for.
        interface: String,
        /// Description of the failure.
        reason: String,
    },

    /// The requested interface does not exist.
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    /// The process lacks the privileges to capture packets.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Interface discovery found no usable default interface.
    #[error("no default network interface found")]
    NoDefaultInterface,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
