//! Builders for named types, fields and arguments.
//!
//! Every builder accepts either typed setters or a configuration map with an
//! explicit allow-list of keys. Builders are mutable until the assembly engine
//! finalizes the schema.

mod argument;
mod enums;
mod field;
mod interface;
mod object;
mod scalar;
mod union;

pub use argument::Argument;
pub use enums::{EnumType, EnumValue};
pub use field::Field;
pub use interface::InterfaceType;
pub use object::ObjectType;
pub use scalar::ScalarType;
pub use union::UnionType;

use indexmap::IndexMap;
use loomql_config::keys::kind;
use loomql_core::{Result, SchemaError};
use serde_json::Value;

/// Any named type a schema can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum NamedType {
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(ScalarType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(t) => t.name(),
            Self::Interface(t) => t.name(),
            Self::Union(t) => t.name(),
            Self::Enum(t) => t.name(),
            Self::Scalar(t) => t.name(),
        }
    }

    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(t) if t.is_input() => "input",
            Self::Object(_) => "type",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::Scalar(_) => "scalar",
        }
    }

    /// Whether values of this type may appear in argument or input positions.
    pub fn is_input_compatible(&self) -> bool {
        match self {
            Self::Object(t) => t.is_input(),
            Self::Enum(_) | Self::Scalar(_) => true,
            Self::Interface(_) | Self::Union(_) => false,
        }
    }

    /// Whether values of this type may appear in output positions.
    pub fn is_output_compatible(&self) -> bool {
        !matches!(self, Self::Object(t) if t.is_input())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Object(t) => t.validate(),
            Self::Interface(t) => t.validate(),
            Self::Union(t) => t.validate(),
            Self::Enum(t) => t.validate(),
            Self::Scalar(_) => Ok(()),
        }
    }
}

/// Applies a `plugins` config map: `true` enables with an empty config, a map
/// sets the config, `false` removes a previously set plugin.
pub(crate) fn apply_plugins_config(
    plugins: &mut IndexMap<String, Value>,
    value: &Value,
    context: &str,
) -> Result<()> {
    let entries = value
        .as_object()
        .ok_or_else(|| SchemaError::config(format!("{context}.plugins must be a map, got {}", kind(value))))?;

    for (identifier, config) in entries {
        match config {
            Value::Bool(false) => {
                plugins.shift_remove(identifier);
            }
            Value::Bool(true) | Value::Null => {
                plugins.insert(identifier.clone(), Value::Object(Default::default()));
            }
            Value::Object(_) => {
                plugins.insert(identifier.clone(), config.clone());
            }
            other => {
                return Err(SchemaError::config(format!(
                    "{context}.plugins.{identifier} must be true, false or a map, got {}",
                    kind(other)
                )));
            }
        }
    }
    Ok(())
}

/// Parses a `fields` config map into fields, keyed by field name.
pub(crate) fn fields_from_config(value: &Value, context: &str) -> Result<Vec<Field>> {
    let entries = value
        .as_object()
        .ok_or_else(|| SchemaError::config(format!("{context}.fields must be a map, got {}", kind(value))))?;

    entries
        .iter()
        .map(|(signature, config)| Field::new(signature, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugins_config() {
        let mut plugins = IndexMap::new();
        apply_plugins_config(&mut plugins, &json!({"a": true, "b": {"x": 1}}), "type").unwrap();
        apply_plugins_config(&mut plugins, &json!({"a": false}), "type").unwrap();
        assert_eq!(plugins.keys().collect::<Vec<_>>(), vec!["b"]);

        assert!(apply_plugins_config(&mut plugins, &json!(["a"]), "type").is_err());
        assert!(apply_plugins_config(&mut plugins, &json!({"a": 1}), "type").is_err());
    }

    #[test]
    fn test_named_type_kinds() {
        let input = NamedType::Object(ObjectType::input("ArticleInput").unwrap());
        assert_eq!(input.kind(), "input");
        assert!(input.is_input_compatible());
        assert!(!input.is_output_compatible());

        let union = NamedType::Union(UnionType::new("Result").unwrap());
        assert!(!union.is_input_compatible());
        assert!(union.is_output_compatible());
    }
}
