// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! A bare exclusive lock.
//!
//! This is a thin wrapper around `parking_lot::RawMutex`: no guard, no
//! poisoning, no owner tracking, no deadlock detection.  It has almost no
//! built-in guarantees, which is exactly what the layer above wants.  The
//! owner discipline lives in [`sync::Mutex`], not here.
//!
//! [`sync::Mutex`]: crate::sync::Mutex

use parking_lot::lock_api::RawMutex as _;

/// A raw exclusive lock with explicit `lock`/`unlock`.
pub struct RawLock {
    raw: parking_lot::RawMutex,
}

impl RawLock {
    /// A new, unlocked lock.
    pub const fn new() -> RawLock {
        RawLock {
            raw: parking_lot::RawMutex::INIT,
        }
    }

    /// Block the calling thread until the lock is held.
    pub fn lock(&self) {
        self.raw.lock();
    }

    /// Take the lock without blocking.  Returns whether it was taken.
    pub fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    /// Release the lock.
    ///
    /// The lock must currently be held.  The caller is responsible for the
    /// by-owner discipline; nothing here checks which thread took the lock.
    pub fn unlock(&self) {
        // SAFETY: per the contract above, the lock is held when this is
        // called.
        unsafe { self.raw.unlock() }
    }

    /// Whether the lock is currently held by some thread.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for RawLock {
    fn default() -> RawLock {
        RawLock::new()
    }
}
