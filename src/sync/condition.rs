// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Monitor-style condition variable.

use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::sync::{Mutex, Waiter};
use crate::time::Timeout;

/// A condition variable built from a FIFO queue of one-shot [`Waiter`] gates,
/// protected by the same [`Mutex`] that guards the predicate.
///
/// The guard mutex is part of the condition and is exposed through
/// [`acquire`]/[`release`]/[`lock`], so a call site uses the condition
/// exactly like a mutex with extra wait/notify operations.  Every operation
/// that touches the waiter queue insists that the calling thread holds the
/// guard and fails with [`Error::NotOwner`] otherwise; the whole design
/// assumes monitor discipline, so violations fail fast instead of being
/// tolerated.
///
/// Waiters are woken strictly in arrival order.  After a `notify_all`, the
/// order in which woken threads retake the guard is up to the scheduler.
///
/// [`acquire`]: Condition::acquire
/// [`release`]: Condition::release
/// [`lock`]: Condition::lock
pub struct Condition {
    guard: Mutex,
    /// Waiting threads in arrival order.  Only touched while `guard` is held
    /// by the calling thread.
    waiters: UnsafeCell<VecDeque<Arc<Waiter>>>,
}

// SAFETY: `waiters` is only accessed after verifying that the calling thread
// owns `guard`, which serializes all access to the queue.
unsafe impl Send for Condition {}
unsafe impl Sync for Condition {}

impl Condition {
    /// A new condition with its own (unheld) guard mutex.
    pub const fn new() -> Condition {
        Condition {
            guard: Mutex::new(),
            waiters: UnsafeCell::new(VecDeque::new()),
        }
    }

    /// Take the guard mutex.
    pub fn acquire(&self) {
        self.guard.acquire();
    }

    /// Release the guard mutex.  Must only be called by the owner.
    pub fn release(&self) {
        self.guard.release();
    }

    /// Take the guard, returning an RAII handle that releases on drop.
    pub fn lock(&self) -> ConditionGuard<'_> {
        self.acquire();
        ConditionGuard { cond: self }
    }

    fn check_owned(&self) -> Result<()> {
        if self.guard.is_owned_by_current() {
            Ok(())
        } else {
            Err(Error::NotOwner)
        }
    }

    /// The waiter queue.  Callers must have passed [`check_owned`] on this
    /// entry into the monitor and must drop the reference before releasing
    /// the guard.
    ///
    /// [`check_owned`]: Condition::check_owned
    #[allow(clippy::mut_from_ref)]
    unsafe fn waiters(&self) -> &mut VecDeque<Arc<Waiter>> {
        &mut *self.waiters.get()
    }

    /// Number of threads currently queued.  Requires the guard.
    pub fn waiter_count(&self) -> Result<usize> {
        self.check_owned()?;
        // SAFETY: ownership verified above.
        Ok(unsafe { self.waiters() }.len())
    }

    /// Release the guard, block until notified or timed out, then retake the
    /// guard before returning.
    ///
    /// Returns `true` when the wake came from a notify.  When the wait was
    /// not satisfied, the stale queue entry is removed, unless a concurrent
    /// notify already popped it, in which case the removal is a no-op and the
    /// notify is simply spent.
    pub fn wait(&self, timeout: impl Into<Timeout>) -> Result<bool> {
        self.check_owned()?;
        let waiter = Arc::new(Waiter::new());
        // SAFETY: ownership verified above; the reference does not outlive
        // this statement.
        unsafe { self.waiters() }.push_back(Arc::clone(&waiter));
        self.release();

        let outcome = Arc::clone(&waiter).acquire(timeout);

        // The guard is retaken no matter how the wait resolved.
        self.acquire();
        if !matches!(outcome, Ok(true)) {
            // SAFETY: guard retaken just above.
            let queue = unsafe { self.waiters() };
            if let Some(pos) = queue.iter().position(|w| Arc::ptr_eq(w, &waiter)) {
                queue.remove(pos);
            }
        }
        outcome
    }

    /// Wait until `predicate` returns true, or `timeout` elapses.
    ///
    /// A predicate that already holds returns immediately without blocking.
    /// Otherwise the absolute deadline is fixed once, and the remaining
    /// budget is recomputed before every block so that repeated early wakes
    /// cannot stretch the total wait.  The return value is the last observed
    /// value of the predicate.
    pub fn wait_for(
        &self,
        mut predicate: impl FnMut() -> bool,
        timeout: impl Into<Timeout>,
    ) -> Result<bool> {
        let mut result = predicate();
        if result {
            return Ok(true);
        }
        let deadline = timeout.into().deadline_from(Instant::now());
        while !result {
            let remaining = match deadline {
                None => Timeout::Forever,
                Some(end) => {
                    let now = Instant::now();
                    if now >= end {
                        break;
                    }
                    Timeout::After(end - now)
                }
            };
            self.wait(remaining)?;
            result = predicate();
        }
        Ok(result)
    }

    /// Wake up to `n` waiters, oldest first.
    pub fn notify(&self, n: usize) -> Result<()> {
        self.check_owned()?;
        for _ in 0..n {
            // SAFETY: ownership verified above.
            let Some(waiter) = unsafe { self.waiters() }.pop_front() else {
                break;
            };
            if !waiter.release() {
                // Lost the race with the waiter's own timeout; it will skip
                // its queue removal when it finds the entry already gone.
                log::debug!("notify raced with a timed-out waiter");
            }
        }
        Ok(())
    }

    /// Wake every currently queued waiter.
    pub fn notify_all(&self) -> Result<()> {
        let n = self.waiter_count()?;
        self.notify(n)
    }
}

impl Default for Condition {
    fn default() -> Condition {
        Condition::new()
    }
}

/// RAII handle for [`Condition::lock`].  Releases the guard when dropped.
pub struct ConditionGuard<'a> {
    cond: &'a Condition,
}

impl Drop for ConditionGuard<'_> {
    fn drop(&mut self) {
        self.cond.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Spawn `n` waiters, guaranteeing arrival order by index.
    fn spawn_waiters(
        cond: &Arc<Condition>,
        order: &Arc<parking_lot::Mutex<Vec<usize>>>,
        n: usize,
    ) -> Vec<thread::JoinHandle<()>> {
        let mut handles = Vec::new();
        for i in 0..n {
            let cond2 = Arc::clone(cond);
            let order2 = Arc::clone(order);
            handles.push(thread::spawn(move || {
                let _guard = cond2.lock();
                assert!(cond2.wait(Timeout::Forever).unwrap());
                order2.lock().push(i);
            }));
            // Only start the next waiter once this one is queued.
            loop {
                let _guard = cond.lock();
                if cond.waiter_count().unwrap() == i + 1 {
                    break;
                }
                drop(_guard);
                thread::sleep(Duration::from_millis(2));
            }
        }
        handles
    }

    #[test]
    fn notify_wakes_in_arrival_order() {
        let cond = Arc::new(Condition::new());
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let handles = spawn_waiters(&cond, &order, 4);

        for expect in [vec![0], vec![0, 1], vec![0, 1, 2]] {
            {
                let _guard = cond.lock();
                cond.notify(1).unwrap();
            }
            // Wait for the woken thread to record itself.
            let begin = Instant::now();
            while order.lock().len() < expect.len() {
                assert!(begin.elapsed() < Duration::from_secs(5));
                thread::sleep(Duration::from_millis(2));
            }
            assert_eq!(*order.lock(), expect);
        }

        {
            let _guard = cond.lock();
            // More than are queued; wakes just the one remaining.
            cond.notify(10).unwrap();
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn notify_all_wakes_everyone() {
        let cond = Arc::new(Condition::new());
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let handles = spawn_waiters(&cond, &order, 3);
        {
            let _guard = cond.lock();
            assert_eq!(cond.waiter_count().unwrap(), 3);
            cond.notify_all().unwrap();
            assert_eq!(cond.waiter_count().unwrap(), 0);
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(order.lock().len(), 3);
    }

    #[test]
    fn wait_timeout_leaves_no_queue_entry() {
        let cond = Condition::new();
        let _guard = cond.lock();
        let begin = Instant::now();
        assert!(!cond.wait(Duration::from_millis(60)).unwrap());
        assert!(begin.elapsed() >= Duration::from_millis(60));
        assert_eq!(cond.waiter_count().unwrap(), 0);
    }

    #[test]
    fn operations_require_the_guard() {
        let cond = Condition::new();
        assert!(matches!(cond.wait(Timeout::NoWait), Err(Error::NotOwner)));
        assert!(matches!(cond.notify(1), Err(Error::NotOwner)));
        assert!(matches!(cond.notify_all(), Err(Error::NotOwner)));
        assert!(matches!(cond.waiter_count(), Err(Error::NotOwner)));

        // Holding the guard on another thread does not help this one.
        let cond = Arc::new(Condition::new());
        let cond2 = Arc::clone(&cond);
        cond.acquire();
        let res = thread::spawn(move || cond2.notify(1)).join().unwrap();
        assert!(matches!(res, Err(Error::NotOwner)));
        cond.release();
    }

    #[test]
    fn wait_for_returns_immediately_when_already_true() {
        let cond = Condition::new();
        let _guard = cond.lock();
        let begin = Instant::now();
        assert!(cond.wait_for(|| true, Duration::from_secs(10)).unwrap());
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_for_sees_a_late_producer() {
        let cond = Arc::new(Condition::new());
        let flag = Arc::new(AtomicBool::new(false));

        let cond2 = Arc::clone(&cond);
        let flag2 = Arc::clone(&flag);
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let _guard = cond2.lock();
            flag2.store(true, Ordering::Release);
            cond2.notify_all().unwrap();
        });

        let _guard = cond.lock();
        let satisfied = cond
            .wait_for(|| flag.load(Ordering::Acquire), Duration::from_secs(5))
            .unwrap();
        assert!(satisfied);
        producer.join().unwrap();
    }

    #[test]
    fn wait_for_gives_up_at_the_deadline() {
        let cond = Condition::new();
        let _guard = cond.lock();
        let begin = Instant::now();
        let satisfied = cond
            .wait_for(|| false, Duration::from_millis(100))
            .unwrap();
        assert!(!satisfied);
        let elapsed = begin.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        // The budget is absolute, not per-block.
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(cond.waiter_count().unwrap(), 0);
    }
}
