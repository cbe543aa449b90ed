// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Single-use wake gate.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};

use crate::error::{Error, Result};
use crate::sys::OneShotTimer;
use crate::time::Timeout;

/// Gate is closed; the waiting thread stays parked.
const PENDING: u8 = 0;
/// Gate was opened by an explicit [`Waiter::release`].
const NOTIFIED: u8 = 1;
/// Gate was forced open by the deadline timer.
const TIMED_OUT: u8 = 2;

/// A single-use wake gate, parking exactly one thread until it is released
/// or times out.
///
/// The gate starts closed.  [`acquire`] blocks the constructing thread; with
/// a finite timeout it also arms a [`OneShotTimer`] whose callback performs a
/// timed-out release.  The explicit release and the timer race for a single
/// atomic transition away from [`PENDING`]: whichever wins decides the
/// outcome, and the loser observes "already open" and does nothing.  Two
/// independent flags would allow a lost wakeup here; the one-word
/// compare-exchange cannot.
///
/// A waiter is consumed by its one `acquire` call.  A second call is a
/// programming error and fails with [`Error::WaiterConsumed`].
///
/// [`acquire`]: Waiter::acquire
pub struct Waiter {
    /// Gate state; one transition away from `PENDING`, ever.
    gate: AtomicU8,
    /// Set when `acquire` claims the waiter.
    consumed: AtomicBool,
    /// The waiting side.  The thread that constructs the waiter is the one
    /// that parks in `acquire`.
    parked: Thread,
}

impl Waiter {
    /// A new closed gate.  The calling thread is the waiting side.
    pub fn new() -> Waiter {
        Waiter {
            gate: AtomicU8::new(PENDING),
            consumed: AtomicBool::new(false),
            parked: thread::current(),
        }
    }

    /// Block until the gate opens.
    ///
    /// Returns `true` when the wake came from [`release`], `false` when the
    /// deadline elapsed first.  [`Timeout::NoWait`] only polls the gate.
    ///
    /// [`release`]: Waiter::release
    pub fn acquire(self: Arc<Self>, timeout: impl Into<Timeout>) -> Result<bool> {
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Err(Error::WaiterConsumed);
        }
        debug_assert_eq!(
            thread::current().id(),
            self.parked.id(),
            "a waiter must be acquired by the thread that constructed it",
        );

        let timer = match timeout.into() {
            Timeout::Forever => None,
            Timeout::NoWait => {
                // Poll: close out the gate right now if nothing opened it.
                let _ = self.try_open(TIMED_OUT);
                None
            }
            Timeout::After(delay) => {
                let gate = Arc::clone(&self);
                Some(OneShotTimer::start(delay, move || {
                    if gate.try_open(TIMED_OUT) {
                        gate.parked.unpark();
                    }
                })?)
            }
        };

        // Park until the gate leaves PENDING.  Parking tokens make this safe
        // against the release/park interleaving: an unpark delivered before
        // the park makes the park return immediately.  Spurious wakes just go
        // around the loop.
        while self.gate.load(Ordering::Acquire) == PENDING {
            thread::park();
        }

        if let Some(timer) = timer {
            timer.stop();
        }
        Ok(self.gate.load(Ordering::Acquire) == NOTIFIED)
    }

    /// Open the gate, waking the parked thread.
    ///
    /// Returns `false` if the gate was already open.  A double release is
    /// tolerated and reported, not fatal.
    pub fn release(&self) -> bool {
        if self.try_open(NOTIFIED) {
            self.parked.unpark();
            true
        } else {
            false
        }
    }

    /// The single atomic transition away from `PENDING`.
    fn try_open(&self, to: u8) -> bool {
        self.gate
            .compare_exchange(PENDING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for Waiter {
    fn default() -> Waiter {
        Waiter::new()
    }
}
