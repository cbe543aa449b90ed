// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! # Bridge errors
//!
//! One error type covers the whole crate.  The variants fall into three
//! classes with very different handling policies:
//!
//! - [`TimedOut`] is expected and recoverable; loop code checks for it with
//!   [`is_timeout`] and simply tries again.
//! - [`NotOwner`] and [`WaiterConsumed`] are programming errors in the use of
//!   the monitor primitives.  They fail immediately and are never retried.
//! - [`NotOpen`], [`Io`] and [`Config`] come from the transports and the
//!   configuration layer.  The forwarding loops log these and keep going.
//!
//! [`TimedOut`]: Error::TimedOut
//! [`NotOwner`]: Error::NotOwner
//! [`WaiterConsumed`]: Error::WaiterConsumed
//! [`NotOpen`]: Error::NotOpen
//! [`Io`]: Error::Io
//! [`Config`]: Error::Config
//! [`is_timeout`]: Error::is_timeout

use std::io;

use thiserror::Error;

/// An error from the synchronization layer, a transport, or the config
/// loader.
#[derive(Debug, Error)]
pub enum Error {
    /// A blocking operation did not complete before its deadline.
    #[error("operation timed out")]
    TimedOut,

    /// A monitor operation was called by a thread that does not hold the
    /// guard mutex.
    #[error("calling thread does not hold the guard mutex")]
    NotOwner,

    /// A one-shot waiter was acquired a second time.
    #[error("one-shot waiter has already been consumed")]
    WaiterConsumed,

    /// A transport operation was attempted before `open`/`connect`.
    #[error("transport is not open")]
    NotOpen,

    /// An unexpected failure in the underlying transport or file system.
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// The configuration document could not be parsed or serialized.
    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is the recoverable timeout kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TimedOut)
    }
}

/// Wraps a value with a possible bridge error.
pub type Result<T> = std::result::Result<T, Error>;
