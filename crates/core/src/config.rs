// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Application configuration.
//!
//! One TOML file declares the batching constants and every table schema:
//!
//! ```toml
//! [sync]
//! chunk_size = 50
//! chunk_delay_ms = 1100
//!
//! [[table]]
//! name = "equipment"
//! primary_key = "equipment_no"
//! columns = ["equipment_no", "model", "assignee", "status"]
//! mode = "bidirectional"
//! ```
//!
//! The chunk size and inter-chunk delay encode the remote provider's request
//! quota and must be tunable without a code change.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::schema::{SchemaRegistry, TableSchema};

/// Default rows per batched remote write request.
pub const DEFAULT_CHUNK_SIZE: usize = 50;
/// Default pause between batched write requests, in milliseconds.
pub const DEFAULT_CHUNK_DELAY_MS: u64 = 1100;

/// Batching constants for the remote store client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTuning {
    /// Rows per remote write request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Pause between write requests (the rate-limit window), in milliseconds.
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_delay_ms() -> u64 {
    DEFAULT_CHUNK_DELAY_MS
}

impl Default for SyncTuning {
    fn default() -> Self {
        SyncTuning {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay_ms: DEFAULT_CHUNK_DELAY_MS,
        }
    }
}

impl SyncTuning {
    /// The inter-chunk delay as a [`Duration`].
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

/// On-disk shape of the configuration file.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sync: SyncTuning,
    #[serde(default, rename = "table")]
    tables: Vec<TableSchema>,
}

/// Loaded and validated application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Batching constants.
    pub tuning: SyncTuning,
    /// Validated table schemas.
    pub registry: SchemaRegistry,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path)?;
        Config::from_toml(&text)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Config> {
        let file: ConfigFile = toml::from_str(text)?;
        if file.sync.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(Config {
            tuning: file.sync,
            registry: SchemaRegistry::new(file.tables)?,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
