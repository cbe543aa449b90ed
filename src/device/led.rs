// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Status LED with a fire-and-forget blink burst.
//!
//! The interesting part is not the pin toggling but the reuse guard: a blink
//! burst runs on its own [`ManagedThread`], and a `blink` call that lands
//! while a previous burst is still running is a silent no-op.  Bursts never
//! stack, so a chatty uplink cannot queue up minutes of blinking.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::thread::{ManagedThread, StopToken};

/// The output pin capability: synchronous, instantaneous side effects.
/// Driving the actual GPIO lives behind this trait.
pub trait IndicatorPin: Send + Sync {
    /// Drive the output high.
    fn set_high(&self);
    /// Drive the output low.
    fn set_low(&self);
}

/// A status LED.
pub struct Led {
    pin: Arc<dyn IndicatorPin>,
    /// The current (or most recent) burst worker.  The slot lock is only
    /// held to check/replace the worker, never while blinking.
    burst: parking_lot::Mutex<Option<ManagedThread>>,
}

impl Led {
    /// Wrap an output pin.
    pub fn new(pin: Arc<dyn IndicatorPin>) -> Led {
        Led {
            pin,
            burst: parking_lot::Mutex::new(None),
        }
    }

    /// Turn the LED on.
    pub fn on(&self) {
        self.pin.set_high();
    }

    /// Turn the LED off.
    pub fn off(&self) {
        self.pin.set_low();
    }

    /// Start a blink burst: on for `on_ms`, off for `off_ms`, `count` times.
    ///
    /// A call made while a previous burst is still running is a silent
    /// no-op.  Once the burst worker exits, the next call starts a fresh one.
    pub fn blink(&self, on_ms: u64, off_ms: u64, count: u32) {
        let mut slot = self.burst.lock();
        if slot.as_ref().is_some_and(|t| t.is_running()) {
            return;
        }
        let pin = Arc::clone(&self.pin);
        let worker = ManagedThread::new("led-blink", move |token: &StopToken| {
            for _ in 0..count {
                if token.is_stopped() {
                    break;
                }
                pin.set_high();
                thread::sleep(Duration::from_millis(on_ms));
                pin.set_low();
                thread::sleep(Duration::from_millis(off_ms));
            }
        });
        worker.start();
        *slot = Some(worker);
    }

    /// Cancel a burst in progress, if any.  The worker stops at its next
    /// toggle boundary.
    pub fn stop_blink(&self) {
        if let Some(worker) = &*self.burst.lock() {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[derive(Default)]
    struct CountingPin {
        highs: AtomicU32,
        lows: AtomicU32,
    }

    impl IndicatorPin for CountingPin {
        fn set_high(&self) {
            self.highs.fetch_add(1, Ordering::Relaxed);
        }
        fn set_low(&self) {
            self.lows.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn wait_idle(led: &Led) {
        let begin = Instant::now();
        loop {
            let running = led
                .burst
                .lock()
                .as_ref()
                .is_some_and(|t| t.is_running());
            if !running {
                break;
            }
            assert!(begin.elapsed() < Duration::from_secs(10));
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn burst_toggles_count_times() {
        let pin = Arc::new(CountingPin::default());
        let led = Led::new(Arc::clone(&pin) as Arc<dyn IndicatorPin>);
        led.blink(1, 1, 5);
        wait_idle(&led);
        assert_eq!(pin.highs.load(Ordering::Relaxed), 5);
        assert_eq!(pin.lows.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn bursts_do_not_stack() {
        let pin = Arc::new(CountingPin::default());
        let led = Led::new(Arc::clone(&pin) as Arc<dyn IndicatorPin>);
        led.blink(5, 5, 20);
        // Second call lands while the first burst is running.
        led.blink(5, 5, 20);
        wait_idle(&led);
        assert_eq!(pin.highs.load(Ordering::Relaxed), 20);
        assert_eq!(pin.lows.load(Ordering::Relaxed), 20);

        // A burst after the first finished does run.
        led.blink(1, 1, 3);
        wait_idle(&led);
        assert_eq!(pin.highs.load(Ordering::Relaxed), 23);
    }

    #[test]
    fn stop_ends_a_burst_early() {
        let pin = Arc::new(CountingPin::default());
        let led = Led::new(Arc::clone(&pin) as Arc<dyn IndicatorPin>);
        led.blink(10, 10, 1000);
        thread::sleep(Duration::from_millis(50));
        led.stop_blink();
        wait_idle(&led);
        assert!(pin.highs.load(Ordering::Relaxed) < 1000);
    }

    #[test]
    fn manual_on_off() {
        let pin = Arc::new(CountingPin::default());
        let led = Led::new(Arc::clone(&pin) as Arc<dyn IndicatorPin>);
        led.on();
        led.off();
        assert_eq!(pin.highs.load(Ordering::Relaxed), 1);
        assert_eq!(pin.lows.load(Ordering::Relaxed), 1);
    }
}
