// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Worker thread wrapper.
//!
//! [`ManagedThread`] wraps the raw spawn capability with start/stop/liveness
//! and panic containment.  A panic in the target is caught at the thread
//! boundary, logged, and recorded where [`last_panic`] can inspect it; the
//! thread simply ends, and the rest of the process is untouched.
//!
//! Stopping is cooperative: there is no way to abruptly kill a thread here,
//! so [`stop`] raises a [`StopToken`] that the target is expected to poll at
//! its cancellation points.  Each `start` gets run state of its own, and the
//! token is bound to the run it was handed to.  A restart therefore cannot
//! un-cancel a previous run that has not yet polled its token, and a
//! lingering old run cannot clobber the liveness of the new one.
//!
//! The only worker that is ever stopped is the LED blink burst, whose loop
//! polls the token between toggles; the two bridge forwarding workers run for
//! the life of the process.
//!
//! [`last_panic`]: ManagedThread::last_panic
//! [`stop`]: ManagedThread::stop

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use crate::sys::{self, ThreadIdent};

/// State of a single run, shared between the handle, the trampoline, and the
/// run's [`StopToken`].  Never reused across runs.
struct RunState {
    /// True from `start` until the trampoline returns.
    alive: AtomicBool,
    /// Ident of the running thread, zero when none.
    ident: AtomicU64,
    /// Cancellation request for this run only.
    stopped: AtomicBool,
}

impl RunState {
    fn is_live(&self) -> bool {
        self.ident.load(Ordering::Relaxed) != 0 && self.alive.load(Ordering::Acquire)
    }
}

/// Cooperative cancellation flag handed to a [`ManagedThread`] target.
///
/// Bound to one run: a token raised by [`ManagedThread::stop`] stays raised
/// for that run even if the worker is started again in the meantime.
#[derive(Clone)]
pub struct StopToken {
    run: Arc<RunState>,
}

impl StopToken {
    /// Whether [`ManagedThread::stop`] has been requested for this run.
    pub fn is_stopped(&self) -> bool {
        self.run.stopped.load(Ordering::Relaxed)
    }
}

/// A worker thread with start/stop/liveness and panic containment.
///
/// `start` is a no-op while the thread is running; a finished thread may be
/// started again with a fresh run of the same target.
pub struct ManagedThread {
    name: String,
    target: Arc<dyn Fn(&StopToken) + Send + Sync>,
    /// The current run, if any.  Replaced wholesale on each `start`.
    run: parking_lot::Mutex<Option<Arc<RunState>>>,
    /// Payload of the last contained panic, if any.
    panic_msg: Arc<parking_lot::Mutex<Option<String>>>,
}

impl ManagedThread {
    /// A new, unstarted worker running `target` on each `start`.
    pub fn new<F>(name: impl Into<String>, target: F) -> ManagedThread
    where
        F: Fn(&StopToken) + Send + Sync + 'static,
    {
        ManagedThread {
            name: name.into(),
            target: Arc::new(target),
            run: parking_lot::Mutex::new(None),
            panic_msg: Arc::new(parking_lot::Mutex::new(None)),
        }
    }

    /// Start the worker.  A no-op if it is already running.
    ///
    /// Allocates fresh run state, so a stop requested against a previous run
    /// does not carry over.  On return, the new thread's identity has been
    /// published, so an immediate [`is_running`] observes the fresh run.
    ///
    /// [`is_running`]: ManagedThread::is_running
    pub fn start(&self) {
        let mut slot = self.run.lock();
        if slot.as_ref().is_some_and(|run| run.is_live()) {
            return;
        }
        *self.panic_msg.lock() = None;

        let run = Arc::new(RunState {
            alive: AtomicBool::new(true),
            ident: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        });
        let target = Arc::clone(&self.target);
        let panic_msg = Arc::clone(&self.panic_msg);
        let (ready_tx, ready_rx) = mpsc::channel();
        let spawned = sys::thread::spawn(&self.name, {
            let run = Arc::clone(&run);
            move || {
                run.ident
                    .store(ThreadIdent::current().as_u64(), Ordering::Relaxed);
                let _ = ready_tx.send(());

                let token = StopToken {
                    run: Arc::clone(&run),
                };
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| target(&token))) {
                    let msg = panic_message(payload.as_ref());
                    log::error!("worker thread panicked: {}", msg);
                    *panic_msg.lock() = Some(msg);
                }
                run.alive.store(false, Ordering::Release);
            }
        });
        match spawned {
            Ok(()) => {
                // Wait for the ident to be published.
                let _ = ready_rx.recv();
                *slot = Some(run);
            }
            Err(e) => {
                log::error!("failed to spawn worker '{}': {}", self.name, e);
            }
        }
    }

    /// Request cancellation of the current run and clear its identity.
    ///
    /// The target keeps running until it next polls its [`StopToken`]; there
    /// is no guarantee about resources it still holds in between.  The
    /// request binds to the current run only and survives a later restart.
    pub fn stop(&self) {
        if let Some(run) = &*self.run.lock() {
            if run.is_live() {
                run.stopped.store(true, Ordering::Relaxed);
                run.ident.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Whether the worker is currently running.
    pub fn is_running(&self) -> bool {
        self.run.lock().as_ref().is_some_and(|run| run.is_live())
    }

    /// Identity of the running thread, if any.
    pub fn ident(&self) -> Option<ThreadIdent> {
        self.run
            .lock()
            .as_ref()
            .and_then(|run| ThreadIdent::from_u64(run.ident.load(Ordering::Relaxed)))
    }

    /// The payload of the last panic contained by this worker, if any.
    /// Cleared on the next `start`.
    pub fn last_panic(&self) -> Option<String> {
        self.panic_msg.lock().clone()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) {
        let begin = Instant::now();
        while !cond() {
            assert!(begin.elapsed() < deadline, "condition never became true");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn runs_target_and_reports_liveness() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = Arc::clone(&ran);
        let worker = ManagedThread::new("test-worker", move |_token: &StopToken| {
            thread::sleep(Duration::from_millis(50));
            ran2.store(true, Ordering::Release);
        });
        assert!(!worker.is_running());
        assert_eq!(worker.ident(), None);

        worker.start();
        assert!(worker.is_running());
        assert!(worker.ident().is_some());

        wait_until(Duration::from_secs(5), || !worker.is_running());
        assert!(ran.load(Ordering::Acquire));
    }

    #[test]
    fn start_while_running_is_a_noop() {
        let runs = Arc::new(AtomicU32::new(0));
        let runs2 = Arc::clone(&runs);
        let worker = ManagedThread::new("test-worker", move |_: &StopToken| {
            runs2.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(80));
        });
        worker.start();
        worker.start();
        worker.start();
        wait_until(Duration::from_secs(5), || !worker.is_running());
        assert_eq!(runs.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn restarts_after_finishing() {
        let runs = Arc::new(AtomicU32::new(0));
        let runs2 = Arc::clone(&runs);
        let worker = ManagedThread::new("test-worker", move |_: &StopToken| {
            runs2.fetch_add(1, Ordering::Relaxed);
        });
        worker.start();
        wait_until(Duration::from_secs(5), || !worker.is_running());
        worker.start();
        wait_until(Duration::from_secs(5), || !worker.is_running());
        assert_eq!(runs.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn contains_panics() {
        let worker = ManagedThread::new("test-worker", |_: &StopToken| {
            panic!("boom");
        });
        worker.start();
        wait_until(Duration::from_secs(5), || !worker.is_running());
        assert_eq!(worker.last_panic().as_deref(), Some("boom"));

        // A clean restart clears the record.
        let worker2 = ManagedThread::new("test-worker", |_: &StopToken| {});
        worker2.start();
        wait_until(Duration::from_secs(5), || !worker2.is_running());
        assert_eq!(worker2.last_panic(), None);
    }

    #[test]
    fn stop_is_observed_by_the_target() {
        let worker = ManagedThread::new("test-worker", |token: &StopToken| {
            while !token.is_stopped() {
                thread::sleep(Duration::from_millis(5));
            }
        });
        worker.start();
        assert!(worker.is_running());
        worker.stop();
        assert_eq!(worker.ident(), None);
        assert!(!worker.is_running());
    }

    #[test]
    fn restart_does_not_revive_a_stopped_run() {
        // The target tracks how many runs are live right now.  A stop
        // followed by an immediate restart must leave exactly one: the old
        // run still sees its own stop request and drains away, and its exit
        // must not mark the new run dead.
        let active = Arc::new(AtomicU32::new(0));
        let active2 = Arc::clone(&active);
        let worker = ManagedThread::new("test-worker", move |token: &StopToken| {
            active2.fetch_add(1, Ordering::SeqCst);
            while !token.is_stopped() {
                thread::sleep(Duration::from_millis(5));
            }
            active2.fetch_sub(1, Ordering::SeqCst);
        });
        worker.start();
        wait_until(Duration::from_secs(5), || {
            active.load(Ordering::SeqCst) == 1
        });

        worker.stop();
        worker.start();
        assert!(worker.is_running());

        // Give the old run ample time to poll its token and exit.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(active.load(Ordering::SeqCst), 1);
        assert!(worker.is_running());

        worker.stop();
        wait_until(Duration::from_secs(5), || {
            active.load(Ordering::SeqCst) == 0
        });
        assert!(!worker.is_running());
    }
}
