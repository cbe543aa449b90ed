// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Monitor primitives built from the raw platform capabilities.
//!
//! The layering is bottom-up:
//!
//! - [`Mutex`] adds owner tracking to the bare [`sys::RawLock`].
//! - [`Waiter`] is a single-use wake gate that parks exactly one thread until
//!   it is released or its timer fires.
//! - [`Condition`] is a monitor-style condition variable: a FIFO queue of
//!   waiters protected by the same mutex that guards the predicate.
//!
//! Unlike `std::sync`, the mutex here does not wrap data and the lock is
//! explicit rather than scoped by default.  [`Condition::wait`] has to drop
//! and retake the lock around a park, which the monitor style expresses
//! directly.
//!
//! [`sys::RawLock`]: crate::sys::RawLock

mod condition;
mod mutex;
mod waiter;

pub use condition::{Condition, ConditionGuard};
pub use mutex::{Mutex, MutexGuard};
pub use waiter::Waiter;
