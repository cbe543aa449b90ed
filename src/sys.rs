// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Platform primitives the synchronization layer is built from.
//!
//! The crate deliberately builds its monitor primitives from a very small set
//! of capabilities rather than taking a ready-made condition variable from a
//! runtime: a bare exclusive lock, a way to identify and park the current
//! thread, a detached thread spawn, and a one-shot callback timer.  This
//! module is the host implementation of that set; everything above it is
//! portable to any platform that can provide the same four things.

pub mod lock;
pub mod thread;
pub mod timer;

pub use lock::RawLock;
pub use thread::ThreadIdent;
pub use timer::OneShotTimer;
