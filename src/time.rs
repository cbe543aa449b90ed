// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Time bounds for blocking operations.
//!
//! Every suspension point in the crate takes an `impl Into<Timeout>`, so call
//! sites can pass a plain [`Duration`], an `Option<Duration>` (`None` meaning
//! block forever), or one of the named values directly.

use std::time::{Duration, Instant};

/// How long a blocking operation is willing to wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Block until the operation completes.
    Forever,
    /// Do not block at all.
    NoWait,
    /// Block for at most the given duration.
    After(Duration),
}

impl Timeout {
    /// The absolute deadline implied by this timeout, measured from `start`.
    ///
    /// `None` means there is no deadline ([`Forever`]).
    ///
    /// [`Forever`]: Timeout::Forever
    pub fn deadline_from(self, start: Instant) -> Option<Instant> {
        match self {
            Timeout::Forever => None,
            Timeout::NoWait => Some(start),
            Timeout::After(d) => Some(start + d),
        }
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Timeout {
        Timeout::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Timeout {
        match d {
            Some(d) => Timeout::After(d),
            None => Timeout::Forever,
        }
    }
}
