//! Shape checks for configuration maps.
//!
//! Every component kind has an explicit allow-list of keys. Unknown keys are a
//! hard error so that typos fail the build instead of being silently ignored.

use loomql_core::{Result, SchemaError};
use serde_json::{Map, Value};

/// A configuration map as produced by TOML or JSON documents.
pub type ConfigMap = Map<String, Value>;

/// Returns `value` as a map or fails with a shape error naming `context`.
pub fn config_map<'a>(value: &'a Value, context: &str) -> Result<&'a ConfigMap> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::config(format!("{context} config must be a map, got {}", kind(value))))
}

/// Fails if `map` holds any key outside `allowed`.
pub fn assert_valid_keys(map: &ConfigMap, allowed: &[&str], context: &str) -> Result<()> {
    let invalid: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();

    if invalid.is_empty() {
        return Ok(());
    }

    Err(SchemaError::config(format!(
        "invalid keys in config for {context}: {}. Valid keys: {}",
        invalid.join(", "),
        allowed.join(", ")
    )))
}

/// Reads a string-or-list value as a list of strings.
pub fn string_list(value: &Value, context: &str) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaError::config(format!("{context} must only contain strings"))
                })
            })
            .collect(),
        other => Err(SchemaError::config(format!(
            "{context} must be a string or a list of strings, got {}",
            kind(other)
        ))),
    }
}

/// Reads an optional string key.
pub fn optional_str<'a>(map: &'a ConfigMap, key: &str, context: &str) -> Result<Option<&'a str>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(SchemaError::config(format!(
            "{context}.{key} must be a string, got {}",
            kind(other)
        ))),
    }
}

/// Reads an optional boolean key.
pub fn optional_bool(map: &ConfigMap, key: &str, context: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(SchemaError::config(format!(
            "{context}.{key} must be a boolean, got {}",
            kind(other)
        ))),
    }
}

/// Human readable JSON kind for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assert_valid_keys() {
        let value = json!({"type": "String", "description": "d"});
        let map = config_map(&value, "field").unwrap();
        assert!(assert_valid_keys(map, &["type", "description"], "field").is_ok());

        let value = json!({"type": "String", "colour": "red", "size": 1});
        let map = config_map(&value, "field").unwrap();
        let err = assert_valid_keys(map, &["type"], "field Article.title").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid keys in config for field Article.title: colour, size"));
    }

    #[test]
    fn test_config_map_rejects_scalars() {
        let err = config_map(&json!(3), "type Article").unwrap_err();
        assert!(err.to_string().contains("type Article config must be a map, got number"));
    }

    #[test]
    fn test_string_list() {
        assert_eq!(string_list(&json!("Node"), "interfaces").unwrap(), vec!["Node"]);
        assert_eq!(
            string_list(&json!(["Node", "Entity"]), "interfaces").unwrap(),
            vec!["Node", "Entity"]
        );
        assert!(string_list(&json!([1]), "interfaces").is_err());
        assert!(string_list(&json!({"a": 1}), "interfaces").is_err());
    }

    #[test]
    fn test_optional_accessors() {
        let value = json!({"isInput": true, "description": "d", "bad": 1});
        let map = config_map(&value, "type").unwrap();
        assert_eq!(optional_bool(map, "isInput", "type").unwrap(), Some(true));
        assert_eq!(optional_str(map, "description", "type").unwrap(), Some("d"));
        assert_eq!(optional_str(map, "missing", "type").unwrap(), None);
        assert!(optional_str(map, "bad", "type").is_err());
    }
}
