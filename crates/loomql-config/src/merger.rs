//! Grouping and merging of schema documents
//!
//! Documents are kept in load order per schema key. Component sections
//! (`types`, `models`, ...) are applied one document at a time by the
//! assembly engine so that its own merge rules govern same-named types.
//! Only the `config` section is deep-merged here (later documents win on
//! scalars, maps merge recursively).

use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::{ConfigError, Result};

/// Schema key used when a document doesn't name one.
pub const DEFAULT_SCHEMA_KEY: &str = "default";

/// Top-level key selecting which schema a document belongs to.
pub const SCHEMA_SELECTOR_KEY: &str = "schema";

/// One loaded configuration document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Where the document came from (for diagnostics)
    pub source: PathBuf,
    /// The schema key the document applies to
    pub schema_key: String,
    /// Document body without the schema selector
    pub body: Value,
}

impl SchemaDocument {
    /// Create a document, extracting the optional `schema` selector.
    pub fn new(source: impl Into<PathBuf>, mut body: Value) -> Result<Self> {
        let source = source.into();
        let map = body.as_object_mut().ok_or_else(|| {
            ConfigError::parse(format!("{} must contain a map at the top level", source.display()))
        })?;

        let schema_key = match map.remove(SCHEMA_SELECTOR_KEY) {
            None => DEFAULT_SCHEMA_KEY.to_string(),
            Some(Value::String(key)) => key,
            Some(other) => {
                return Err(ConfigError::validation(format!(
                    "{}: '{SCHEMA_SELECTOR_KEY}' must be a string, got {other}",
                    source.display()
                )));
            }
        };

        Ok(Self {
            source,
            schema_key,
            body,
        })
    }
}

/// Documents grouped by schema key, in load order.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocuments {
    by_schema: IndexMap<String, Vec<SchemaDocument>>,
}

impl SchemaDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document to its schema group
    pub fn push(&mut self, document: SchemaDocument) {
        debug!(
            source = %document.source.display(),
            schema = %document.schema_key,
            "Registered schema document"
        );
        self.by_schema
            .entry(document.schema_key.clone())
            .or_default()
            .push(document);
    }

    /// All known schema keys, in first-seen order
    pub fn schema_keys(&self) -> impl Iterator<Item = &str> {
        self.by_schema.keys().map(String::as_str)
    }

    /// Documents for one schema key, in load order
    pub fn documents(&self, schema_key: &str) -> &[SchemaDocument] {
        self.by_schema
            .get(schema_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.by_schema.is_empty()
    }

    /// The deep-merged `config` section for one schema key.
    pub fn merged_settings(&self, schema_key: &str) -> Value {
        let mut merged = Value::Object(Default::default());
        for document in self.documents(schema_key) {
            if let Some(config) = document.body.get("config") {
                deep_merge(&mut merged, config.clone());
            }
        }
        merged
    }

    /// Component sections of every document for one schema key, with the
    /// `config` section replaced by the merged one on the first document.
    pub fn component_documents(&self, schema_key: &str) -> Vec<Value> {
        let merged = self.merged_settings(schema_key);
        self.documents(schema_key)
            .iter()
            .enumerate()
            .map(|(index, document)| {
                let mut body = document.body.clone();
                if let Some(map) = body.as_object_mut() {
                    map.remove("config");
                    if index == 0 {
                        map.insert("config".to_string(), merged.clone());
                    }
                }
                body
            })
            .collect()
    }
}

/// Deep merge two JSON values (right takes precedence for conflicts)
pub fn deep_merge(left: &mut Value, right: Value) {
    match (left, right) {
        (Value::Object(left_map), Value::Object(right_map)) => {
            for (key, right_value) in right_map {
                if let Some(left_value) = left_map.get_mut(&key) {
                    deep_merge(left_value, right_value);
                } else {
                    left_map.insert(key, right_value);
                }
            }
        }
        (left, right) => {
            *left = right;
        }
    }
}
