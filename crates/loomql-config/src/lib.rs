//! Configuration for the loomql schema compiler
//!
//! This crate turns files on disk into the format-agnostic documents the
//! schema assembly engine consumes:
//! - Loads TOML and JSON schema documents from files and directories
//! - Groups documents by schema key (`default`, `admin`, ...) in load order
//! - Deep-merges the `config` section across documents of one schema
//! - Validates configuration maps against explicit key allow-lists
//! - Provides build settings for the CLI (`loomql.toml`)
//!
//! # Architecture
//!
//! ```text
//!   schema/*.toml   schema/*.json
//!          │              │
//!          └──── FileSource ────┐
//!                               ▼
//!                       SchemaDocuments
//!                (ordered per schema key, merged config)
//!                               │
//!                               ▼
//!                   Schema::apply_config (loomql-schema)
//! ```

pub mod keys;
pub mod merger;
pub mod settings;
pub mod sources;

pub use keys::{ConfigMap, assert_valid_keys, config_map, optional_bool, optional_str, string_list};
pub use merger::{DEFAULT_SCHEMA_KEY, SchemaDocument, SchemaDocuments, deep_merge};
pub use settings::BuildSettings;
pub use sources::{DocumentFormat, DocumentSource, FileSource, collect_documents};

use loomql_core::SchemaError;

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => SchemaError::Io(e),
            other => SchemaError::config(other.to_string()),
        }
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
