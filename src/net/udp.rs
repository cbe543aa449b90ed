// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! UDP client endpoint.
//!
//! Same surface as [`TcpClient`], over a connected datagram socket.  Each
//! read returns at most one datagram; oversized datagrams are truncated to
//! the requested size by the socket layer.
//!
//! [`TcpClient`]: crate::net::TcpClient

use std::net::UdpSocket;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::net::{is_recv_timeout, recv_timeout, resolve};
use crate::time::Timeout;
use crate::transport::Transport;

/// A UDP client endpoint of the bridge.
pub struct UdpClient {
    host: String,
    port: u16,
    timeout: Option<Duration>,
    socket: parking_lot::Mutex<Option<UdpSocket>>,
}

impl UdpClient {
    /// A new, unconnected client for `host:port`.
    pub fn new(host: impl Into<String>, port: u16, timeout: Option<Duration>) -> UdpClient {
        UdpClient {
            host: host.into(),
            port,
            timeout,
            socket: parking_lot::Mutex::new(None),
        }
    }

    /// Bind an ephemeral local port and connect it to the peer.
    pub fn connect(&self) -> Result<()> {
        let addr = resolve(&self.host, self.port)?;
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(addr)?;
        socket.set_read_timeout(self.timeout)?;
        *self.socket.lock() = Some(socket);
        log::info!("bound udp client for {}:{}", self.host, self.port);
        Ok(())
    }

    /// Drop the socket, if any.
    pub fn disconnect(&self) -> Result<()> {
        self.socket.lock().take();
        Ok(())
    }

    fn handle(&self) -> Result<UdpSocket> {
        match &*self.socket.lock() {
            Some(socket) => Ok(socket.try_clone()?),
            None => Err(Error::NotOpen),
        }
    }

    /// Receive one datagram of up to `size` bytes within `timeout`.
    pub fn read(&self, size: usize, timeout: impl Into<Timeout>) -> Result<Vec<u8>> {
        let socket = self.handle()?;
        socket.set_read_timeout(recv_timeout(timeout.into()))?;
        let mut buf = vec![0u8; size];
        match socket.recv(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if is_recv_timeout(&e) => Err(Error::TimedOut),
            Err(e) => Err(e.into()),
        }
    }

    /// Send the buffer as a single datagram.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let socket = self.handle()?;
        Ok(socket.send(data)?)
    }
}

impl Transport for UdpClient {
    fn open(&self) -> Result<()> {
        self.connect()
    }

    fn close(&self) -> Result<()> {
        self.disconnect()
    }

    fn read(&self, size: usize, timeout: Timeout) -> Result<Vec<u8>> {
        UdpClient::read(self, size, timeout)
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        UdpClient::write(self, data)
    }
}
