// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for depot-core operations.

use thiserror::Error;

/// All possible errors raised while loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate table '{0}' in schema registry")]
    DuplicateTable(String),

    #[error("table '{0}' declares no columns")]
    NoColumns(String),

    #[error("table '{0}' declares an empty primary key")]
    EmptyPrimaryKey(String),

    #[error("primary key column '{column}' of table '{table}' is not in its column list")]
    UnknownKeyColumn { table: String, column: String },

    #[error("invalid chunk size: must be at least 1")]
    InvalidChunkSize,
}

/// A specialized Result type for depot-core operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
