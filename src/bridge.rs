// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! The pair of always-on forwarding loops.
//!
//! Two [`ManagedThread`] workers forward opaque bytes between the serial and
//! network endpoints, one per direction.  Neither worker is ever stopped in
//! normal operation; failure is handled per-iteration.  A read timeout on the
//! downlink is business as usual and continues silently; anything else is
//! logged and the loop goes around again after a short backoff, so a dead
//! endpoint degrades to quiet periodic log lines instead of a hot spin.
//! Redialing a failed endpoint is not attempted here; connection bring-up
//! belongs to whoever constructed the transports.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::device::led::Led;
use crate::sys::ThreadIdent;
use crate::thread::{ManagedThread, StopToken};
use crate::time::Timeout;
use crate::transport::Transport;

/// Per-iteration read size in both directions.
const CHUNK_SIZE: usize = 1024;

/// Blink pattern fired on uplink traffic.
const BLINK_ON_MS: u64 = 50;
const BLINK_OFF_MS: u64 = 50;
const BLINK_COUNT: u32 = 20;

/// Pause after an unexpected transport failure, so a dead endpoint cannot
/// spin the loop hot.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A transparent-transmission bridge session.
///
/// Owns the two endpoints, the optional status LED, and the two direction
/// workers.  [`run`] starts the workers; they live for the rest of the
/// process.
///
/// [`run`]: Bridge::run
pub struct Bridge {
    uplink: ManagedThread,
    downlink: ManagedThread,
}

impl Bridge {
    /// Assemble a session.  `downlink_timeout` bounds each network read so
    /// the downlink worker stays responsive without busy-polling.
    pub fn new(
        serial: Arc<dyn Transport>,
        cloud: Arc<dyn Transport>,
        led: Option<Led>,
        downlink_timeout: Duration,
    ) -> Bridge {
        let led = led.map(Arc::new);

        let uplink = {
            let serial = Arc::clone(&serial);
            let cloud = Arc::clone(&cloud);
            ManagedThread::new("bridge-uplink", move |token: &StopToken| {
                uplink_loop(token, &serial, &cloud, led.as_deref());
            })
        };
        let downlink = ManagedThread::new("bridge-downlink", move |token: &StopToken| {
            downlink_loop(token, &cloud, &serial, downlink_timeout);
        });

        Bridge { uplink, downlink }
    }

    /// Start both direction workers.
    pub fn run(&self) {
        log::info!(
            "starting bridge workers from thread {}",
            ThreadIdent::current()
        );
        self.uplink.start();
        self.downlink.start();
    }

    /// Whether both direction workers are alive.
    pub fn is_running(&self) -> bool {
        self.uplink.is_running() && self.downlink.is_running()
    }
}

/// serial → cloud.  Blocks without a timeout on the serial side; traffic
/// triggers the indicator burst.
fn uplink_loop(
    token: &StopToken,
    serial: &Arc<dyn Transport>,
    cloud: &Arc<dyn Transport>,
    led: Option<&Led>,
) {
    while !token.is_stopped() {
        match serial.read(CHUNK_SIZE, Timeout::Forever) {
            Ok(data) if !data.is_empty() => match cloud.write(&data) {
                Ok(_) => {
                    log::info!("uplink forwarded {} bytes", data.len());
                    if let Some(led) = led {
                        led.blink(BLINK_ON_MS, BLINK_OFF_MS, BLINK_COUNT);
                    }
                }
                Err(e) => {
                    log::error!("uplink transfer error: {}", e);
                    thread::sleep(ERROR_BACKOFF);
                }
            },
            Ok(_) => {}
            Err(e) => {
                log::error!("uplink read error: {}", e);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
}

/// cloud → serial.  A read timeout continues silently.
fn downlink_loop(
    token: &StopToken,
    cloud: &Arc<dyn Transport>,
    serial: &Arc<dyn Transport>,
    timeout: Duration,
) {
    while !token.is_stopped() {
        match cloud.read(CHUNK_SIZE, Timeout::After(timeout)) {
            Ok(data) => {
                if let Err(e) = serial.write(&data) {
                    log::error!("downlink transfer error: {}", e);
                    thread::sleep(ERROR_BACKOFF);
                } else {
                    log::info!("downlink forwarded {} bytes", data.len());
                }
            }
            Err(e) if e.is_timeout() => {
                log::debug!("downlink read timeout, continue");
            }
            Err(e) => {
                log::error!("downlink read error: {}", e);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
}
