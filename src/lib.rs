// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Transparent transmission bridge between a serial link and a network peer.
//!
//! The bridging application itself is a pair of byte-forwarding loops; the
//! substance of this crate is the thread-synchronization layer those loops
//! stand on, built from first principles out of a handful of raw platform
//! capabilities (a bare lock, thread parking, a one-shot timer) rather than
//! taken from a runtime:
//!
//! - [`sync::Mutex`], an exclusive lock that knows its owner.
//! - [`sync::Waiter`], a single-use wake gate with a timeout, safe against
//!   the notify/timeout race.
//! - [`sync::Condition`], a monitor-style condition variable: a FIFO queue
//!   of waiters guarded by the predicate's own mutex.
//! - [`thread::ManagedThread`], a worker wrapper with liveness, cooperative
//!   stop, and panic containment.
//!
//! On top of that sit the two endpoints ([`device::serial`] turns an
//! edge-triggered RX callback into blocking reads; [`net`] wraps TCP/UDP
//! clients) and the [`bridge`] module that ties them together.
//!
//! Logging goes through the [`log`] facade; the crate never installs a
//! logger of its own.

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod net;
pub mod sync;
pub mod sys;
pub mod thread;
pub mod time;
pub mod transport;

pub use error::{Error, Result};
