// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Network client endpoints over the host socket stack.
//!
//! Both clients speak the same [`Transport`] surface as the serial port.
//! Their timeout story differs from the serial side: rather than a condition
//! variable, they lean on the socket's own receive timeout and translate the
//! OS's would-block/timed-out conditions into [`Error::TimedOut`].
//!
//! [`Transport`]: crate::transport::Transport
//! [`Error::TimedOut`]: crate::Error::TimedOut

mod tcp;
mod udp;

pub use tcp::TcpClient;
pub use udp::UdpClient;

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::time::Timeout;

/// Resolve `host:port`, taking the first address.
fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}:{}", host, port),
            ))
        })
}

/// Map a per-call [`Timeout`] to a socket receive timeout.
///
/// The OS rejects a zero receive timeout (it means "no timeout"), so
/// [`Timeout::NoWait`] becomes the shortest expressible wait.
fn recv_timeout(timeout: Timeout) -> Option<Duration> {
    match timeout {
        Timeout::Forever => None,
        Timeout::NoWait => Some(Duration::from_millis(1)),
        Timeout::After(d) => Some(d.max(Duration::from_millis(1))),
    }
}

/// Whether an I/O error is the socket's way of reporting a receive timeout.
fn is_recv_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_loopback() {
        let addr = resolve("127.0.0.1", 9000).unwrap();
        assert_eq!(addr.port(), 9000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn recv_timeout_mapping() {
        assert_eq!(recv_timeout(Timeout::Forever), None);
        assert_eq!(
            recv_timeout(Timeout::NoWait),
            Some(Duration::from_millis(1))
        );
        assert_eq!(
            recv_timeout(Timeout::After(Duration::ZERO)),
            Some(Duration::from_millis(1))
        );
        assert_eq!(
            recv_timeout(Timeout::After(Duration::from_secs(2))),
            Some(Duration::from_secs(2))
        );
    }
}
