// Copyright (c) 2025 the dtu-bridge authors
// SPDX-License-Identifier: Apache-2.0

//! Bridge configuration.
//!
//! A single JSON document describes the two endpoints and the status LED.
//! Loading and saving are thin serde wrappers.  Anything beyond that, such
//! as validation against real hardware or persistence policy, belongs to the
//! integration, not here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration for a bridge instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Display name used in logs.
    pub name: String,
    pub uart: UartConfig,
    pub server: ServerConfig,
    /// Optional status LED; `None` disables the blink burst.
    #[serde(default)]
    pub led: Option<LedConfig>,
}

impl BridgeConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<BridgeConfig> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the configuration back out as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Physical serial port parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UartConfig {
    pub port: u8,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_bytesize")]
    pub bytesize: u8,
    #[serde(default)]
    pub parity: u8,
    #[serde(default = "default_stopbits")]
    pub stopbits: u8,
    #[serde(default)]
    pub flowctl: u8,
}

fn default_baudrate() -> u32 {
    115200
}

fn default_bytesize() -> u8 {
    8
}

fn default_stopbits() -> u8 {
    1
}

/// Remote peer parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Downlink read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    1000
}

/// Status LED parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedConfig {
    /// GPIO number of the indicator output.
    pub gpio: u32,
}
