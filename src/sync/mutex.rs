// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Exclusive lock with owner tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::sys::{RawLock, ThreadIdent};

/// An exclusive lock that records which thread currently holds it.
///
/// The owner record is what lets [`Condition`] enforce monitor discipline:
/// wait and notify fail fast when called by a thread that does not hold the
/// guard, instead of silently corrupting the waiter queue.
///
/// `acquire`/`release` are the primitive operations; [`lock`] is an RAII
/// convenience for plain critical sections.  Like the raw lock underneath,
/// `release` itself does not detect a mismatched caller; call sites that
/// need the check ask [`is_owned_by_current`] first.
///
/// [`Condition`]: crate::sync::Condition
/// [`lock`]: Mutex::lock
/// [`is_owned_by_current`]: Mutex::is_owned_by_current
pub struct Mutex {
    raw: RawLock,
    /// Identity of the holding thread, zero when unheld.  Written only by the
    /// thread that holds (or is releasing) the raw lock.
    owner: AtomicU64,
}

impl Mutex {
    /// A new, unheld mutex.
    pub const fn new() -> Mutex {
        Mutex {
            raw: RawLock::new(),
            owner: AtomicU64::new(0),
        }
    }

    /// Block until the lock is held, then record the caller as owner.
    pub fn acquire(&self) {
        self.raw.lock();
        self.owner
            .store(ThreadIdent::current().as_u64(), Ordering::Relaxed);
    }

    /// Clear ownership and unlock.  Must only be called by the owner.
    pub fn release(&self) {
        self.owner.store(0, Ordering::Relaxed);
        self.raw.unlock();
    }

    /// Whether the lock is currently held by some thread.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// The recorded owner, if the lock is held.
    pub fn owner(&self) -> Option<ThreadIdent> {
        ThreadIdent::from_u64(self.owner.load(Ordering::Relaxed))
    }

    /// Whether the calling thread is the recorded owner of a held lock.
    ///
    /// Relaxed loads are enough here: a thread can only see its own ident in
    /// `owner` if it was the one that stored it, and it stores zero again
    /// before unlocking.
    pub fn is_owned_by_current(&self) -> bool {
        self.is_locked() && self.owner() == Some(ThreadIdent::current())
    }

    /// Acquire, returning a guard that releases on drop.
    pub fn lock(&self) -> MutexGuard<'_> {
        self.acquire();
        MutexGuard { lock: self }
    }
}

impl Default for Mutex {
    fn default() -> Mutex {
        Mutex::new()
    }
}

/// RAII guard for [`Mutex::lock`].  Releases the lock when dropped.
pub struct MutexGuard<'a> {
    lock: &'a Mutex,
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn records_owner() {
        let m = Mutex::new();
        assert!(!m.is_locked());
        assert_eq!(m.owner(), None);

        m.acquire();
        assert!(m.is_locked());
        assert_eq!(m.owner(), Some(ThreadIdent::current()));
        assert!(m.is_owned_by_current());

        m.release();
        assert!(!m.is_locked());
        assert_eq!(m.owner(), None);
    }

    #[test]
    fn other_threads_are_not_owners() {
        let m = Arc::new(Mutex::new());
        m.acquire();
        let m2 = Arc::clone(&m);
        let owned_elsewhere = thread::spawn(move || m2.is_owned_by_current())
            .join()
            .unwrap();
        assert!(!owned_elsewhere);
        assert!(m.is_owned_by_current());
        m.release();
    }

    #[test]
    fn guard_releases_on_drop() {
        let m = Mutex::new();
        {
            let _guard = m.lock();
            assert!(m.is_owned_by_current());
        }
        assert!(!m.is_locked());
    }

    #[test]
    fn excludes_concurrent_holders() {
        let m = Arc::new(Mutex::new());
        let counter = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let m = Arc::clone(&m);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let _guard = m.lock();
                    // Non-atomic read-modify-write under the lock.
                    let v = counter.load(Ordering::Relaxed);
                    thread::yield_now();
                    counter.store(v + 1, Ordering::Relaxed);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 400);
    }
}
