// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! TCP client endpoint.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::net::{is_recv_timeout, recv_timeout, resolve};
use crate::time::Timeout;
use crate::transport::Transport;

/// A TCP client endpoint of the bridge.
///
/// Reads expect to be issued from a single thread (the downlink worker);
/// writes may come from any thread and each grabs its own handle to the
/// stream, so a blocked reader never delays a writer.
pub struct TcpClient {
    host: String,
    port: u16,
    /// Receive timeout applied at connect time; per-call read timeouts
    /// override it.
    timeout: Option<Duration>,
    stream: parking_lot::Mutex<Option<TcpStream>>,
}

impl TcpClient {
    /// A new, unconnected client for `host:port`.
    pub fn new(host: impl Into<String>, port: u16, timeout: Option<Duration>) -> TcpClient {
        TcpClient {
            host: host.into(),
            port,
            timeout,
            stream: parking_lot::Mutex::new(None),
        }
    }

    /// Resolve the host and establish the connection.
    pub fn connect(&self) -> Result<()> {
        let addr = resolve(&self.host, self.port)?;
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(self.timeout)?;
        *self.stream.lock() = Some(stream);
        log::info!("connected to {}:{}", self.host, self.port);
        Ok(())
    }

    /// Drop the connection, if any.
    pub fn disconnect(&self) -> Result<()> {
        if let Some(stream) = self.stream.lock().take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    /// A private handle to the stream.  Clones share the underlying socket,
    /// so I/O on the handle happens without holding the slot lock.
    fn handle(&self) -> Result<TcpStream> {
        match &*self.stream.lock() {
            Some(stream) => Ok(stream.try_clone()?),
            None => Err(Error::NotOpen),
        }
    }

    /// Read up to `size` bytes within `timeout`.
    ///
    /// A peer that closed the connection surfaces as an I/O error rather
    /// than an endless stream of empty reads, so the downlink loop backs off
    /// instead of spinning.
    pub fn read(&self, size: usize, timeout: impl Into<Timeout>) -> Result<Vec<u8>> {
        let stream = self.handle()?;
        stream.set_read_timeout(recv_timeout(timeout.into()))?;
        let mut buf = vec![0u8; size];
        match (&stream).read(&mut buf) {
            Ok(0) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "peer closed the connection",
            ))),
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if is_recv_timeout(&e) => Err(Error::TimedOut),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the whole buffer.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let stream = self.handle()?;
        (&stream).write_all(data)?;
        Ok(data.len())
    }
}

impl Transport for TcpClient {
    fn open(&self) -> Result<()> {
        self.connect()
    }

    fn close(&self) -> Result<()> {
        self.disconnect()
    }

    fn read(&self, size: usize, timeout: Timeout) -> Result<Vec<u8>> {
        TcpClient::read(self, size, timeout)
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        TcpClient::write(self, data)
    }
}
