// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Thread identity and raw spawning.
//!
//! [`ThreadIdent`] is a small process-unique id assigned lazily to each
//! thread.  It exists so the owner field of a mutex can be a single atomic
//! word, which `std::thread::ThreadId` does not offer on stable.

use std::fmt;
use std::io;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

static NEXT_IDENT: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_IDENT: ThreadIdent = ThreadIdent(
        // The counter starts at 1, so the previous value is always non-zero.
        NonZeroU64::new(NEXT_IDENT.fetch_add(1, Ordering::Relaxed))
            .expect("thread ident counter wrapped"),
    );
}

/// Identity of a thread, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadIdent(NonZeroU64);

impl ThreadIdent {
    /// The identity of the calling thread.
    pub fn current() -> ThreadIdent {
        CURRENT_IDENT.with(|id| *id)
    }

    /// The identity as a bare word, for storage in an atomic.  Never zero.
    pub(crate) fn as_u64(self) -> u64 {
        self.0.get()
    }

    /// Recover an identity from a stored word; zero means "no thread".
    pub(crate) fn from_u64(value: u64) -> Option<ThreadIdent> {
        NonZeroU64::new(value).map(ThreadIdent)
    }
}

impl fmt::Display for ThreadIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spawn a detached named thread.
pub(crate) fn spawn<F>(name: &str, f: F) -> io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(f)?;
    Ok(())
}
