// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! One-shot callback timer.
//!
//! [`OneShotTimer::start`] arms a timer that invokes its callback once, from
//! the timer's own context, after the delay elapses.  [`stop`] disarms it.
//! The caller must be prepared for the callback to race with `stop`: a
//! callback that has already started is not interrupted.  Users resolve that
//! race themselves, typically with a single atomic transition on whatever
//! state the callback touches.
//!
//! [`stop`]: OneShotTimer::stop

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::sys;

/// A one-shot timer with millisecond granularity.
///
/// Dropping the timer disarms it, same as [`stop`].
///
/// [`stop`]: OneShotTimer::stop
pub struct OneShotTimer {
    cancel: Sender<()>,
}

impl OneShotTimer {
    /// Arm a timer that fires `callback` after `delay`.
    pub fn start<F>(delay: Duration, callback: F) -> io::Result<OneShotTimer>
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, fired) = mpsc::channel::<()>();
        sys::thread::spawn("oneshot-timer", move || {
            // A cancel message, or the sender dropping, wins over expiry.
            if let Err(RecvTimeoutError::Timeout) = fired.recv_timeout(delay) {
                callback();
            }
        })?;
        Ok(OneShotTimer { cancel })
    }

    /// Disarm the timer.  Idempotent; has no effect once the callback has
    /// started.
    pub fn stop(&self) {
        let _ = self.cancel.send(());
    }
}
