// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Blocking serial reads over an edge-triggered driver.
//!
//! Serial hardware tells us about new data exactly once, by invoking a
//! registered callback from its own context.  [`SerialPort`] turns that
//! edge-triggered event into level-triggered, timeout-bounded blocking reads
//! without busy-polling: the callback's only job is to take the read-side
//! [`Condition`] guard and `notify_all`, and `read` parks in
//! [`Condition::wait_for`] on the "bytes available" predicate.
//!
//! Writes are serialized through a plain [`Mutex`] that is deliberately
//! distinct from the read-side guard, so a parked reader never holds up a
//! writer and concurrent writers cannot interleave their output.

use std::io;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::sync::{Condition, Mutex};
use crate::time::Timeout;
use crate::transport::Transport;

/// The hardware side of a serial port.
///
/// The driver owns the receive buffer and invokes the registered callback
/// from its own context whenever new bytes arrive.  Opening, closing and
/// configuring the physical port live behind this trait; the crate only
/// consumes it.
pub trait SerialDriver: Send + Sync {
    /// Bytes currently buffered on the receive side.
    fn bytes_available(&self) -> usize;

    /// Drain up to `buf.len()` buffered bytes, returning how many were
    /// copied.
    fn read_into(&self, buf: &mut [u8]) -> usize;

    /// Push bytes out the transmit side.
    fn write(&self, data: &[u8]) -> io::Result<usize>;

    /// Register (or with `None`, clear) the "data arrived" callback,
    /// replacing any previous one.
    fn set_rx_callback(&self, callback: Option<Box<dyn Fn() + Send + Sync>>);
}

/// A serial port with blocking, timeout-capable reads.
pub struct SerialPort {
    driver: Arc<dyn SerialDriver>,
    /// Read side: guards the "bytes available" predicate.
    r_cond: Arc<Condition>,
    /// Write side: serializes writers.
    w_lock: Mutex,
}

impl SerialPort {
    /// Wrap a driver.  The port is inert until [`open`] registers the RX
    /// callback.
    ///
    /// [`open`]: SerialPort::open
    pub fn new(driver: Arc<dyn SerialDriver>) -> SerialPort {
        SerialPort {
            driver,
            r_cond: Arc::new(Condition::new()),
            w_lock: Mutex::new(),
        }
    }

    /// Register the RX callback with the driver.
    pub fn open(&self) {
        let cond = Arc::clone(&self.r_cond);
        self.driver.set_rx_callback(Some(Box::new(move || {
            let _guard = cond.lock();
            // A notify with nobody waiting is fine; a reader re-checks the
            // predicate before it ever parks.
            if let Err(e) = cond.notify_all() {
                log::error!("serial rx callback could not notify: {}", e);
            }
        })));
    }

    /// Clear the RX callback.  Blocked readers will run out their timeouts.
    pub fn close(&self) {
        self.driver.set_rx_callback(None);
    }

    /// Read up to `size` bytes, blocking until data arrives or `timeout`
    /// elapses.
    pub fn read(&self, size: usize, timeout: impl Into<Timeout>) -> Result<Vec<u8>> {
        let _guard = self.r_cond.lock();
        let driver = &self.driver;
        if self
            .r_cond
            .wait_for(|| driver.bytes_available() != 0, timeout)?
        {
            let mut buf = vec![0u8; size.min(driver.bytes_available())];
            let n = driver.read_into(&mut buf);
            buf.truncate(n);
            Ok(buf)
        } else {
            Err(Error::TimedOut)
        }
    }

    /// Write bytes to the port.  Concurrent writers are serialized.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let _guard = self.w_lock.lock();
        Ok(self.driver.write(data)?)
    }
}

impl Transport for SerialPort {
    fn open(&self) -> Result<()> {
        SerialPort::open(self);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        SerialPort::close(self);
        Ok(())
    }

    fn read(&self, size: usize, timeout: Timeout) -> Result<Vec<u8>> {
        SerialPort::read(self, size, timeout)
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        SerialPort::write(self, data)
    }
}
