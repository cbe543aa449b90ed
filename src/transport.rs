// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! The byte-stream capability the bridge forwards between.
//!
//! Both endpoints of the bridge, the serial port on one side and a network
//! client on the other, expose the same small surface: open, close, a
//! timeout-bounded blocking read, and a write.  Bytes are opaque; nothing in
//! the crate frames, inspects or rewrites them.

use crate::error::Result;
use crate::time::Timeout;

/// A bidirectional, timeout-capable byte stream endpoint.
pub trait Transport: Send + Sync {
    /// Bring the endpoint up (register callbacks, connect, ...).
    fn open(&self) -> Result<()>;

    /// Tear the endpoint down.  Reversible with another `open`.
    fn close(&self) -> Result<()>;

    /// Read up to `size` bytes, blocking within `timeout`.
    ///
    /// Fails with [`Error::TimedOut`] when no data arrives in time, which
    /// callers treat as "try again", not as a fault.
    ///
    /// [`Error::TimedOut`]: crate::Error::TimedOut
    fn read(&self, size: usize, timeout: Timeout) -> Result<Vec<u8>>;

    /// Write the whole buffer, returning the number of bytes written.
    fn write(&self, data: &[u8]) -> Result<usize>;
}
