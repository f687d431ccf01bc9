// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! depot-core: Shared library for the depot inventory manager.
//!
//! This crate provides the data model and configuration surface consumed by
//! the depot-sync engine: scalar cell values, change-tracked rows, per-table
//! schema descriptors, and the TOML configuration loader.

pub mod config;
pub mod error;
pub mod row;
pub mod schema;
pub mod value;

pub use config::{Config, SyncTuning};
pub use error::{ConfigError, Result};
pub use row::{Row, SyncStatus, KEY_SEPARATOR};
pub use schema::{PrimaryKey, SchemaRegistry, SyncMode, TableSchema};
pub use value::Value;
