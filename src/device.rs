// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Device-side endpoints: the serial port and the status LED.

pub mod led;
pub mod serial;
