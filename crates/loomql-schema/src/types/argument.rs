use loomql_config::keys::{assert_valid_keys, config_map, kind, optional_str};
use loomql_core::{EncodedType, Result, SchemaError, SignatureBuilder, TypeExpr, assert_valid_name};
use serde_json::Value;

const ARGUMENT_KEYS: &[&str] = &["type", "description", "defaultValue"];

/// An argument on a field.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    type_ref: TypeExpr,
    default_value: Option<Value>,
    description: Option<String>,
}

impl Argument {
    pub fn new(name: &str, type_ref: &str) -> Result<Self> {
        assert_valid_name(name, "Argument")?;
        Ok(Self {
            name: name.to_string(),
            type_ref: TypeExpr::parse(type_ref)?,
            default_value: None,
            description: None,
        })
    }

    /// Builds an argument from a bare type string or a
    /// `{type, description, defaultValue}` map.
    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        match config {
            Value::String(ty) => Self::new(name, ty),
            Value::Object(_) => {
                let map = config_map(config, "argument")?;
                let context = format!("argument {name}");
                assert_valid_keys(map, ARGUMENT_KEYS, &context)?;
                let ty = optional_str(map, "type", &context)?.ok_or_else(|| {
                    SchemaError::config(format!("{context} must declare a type"))
                })?;
                let mut argument = Self::new(name, ty)?;
                argument.apply_config(config)?;
                Ok(argument)
            }
            other => Err(SchemaError::config(format!(
                "argument {name} config must be a type string or a map, got {}",
                kind(other)
            ))),
        }
    }

    /// Applies description and default value from a config map.
    pub(crate) fn apply_config(&mut self, config: &Value) -> Result<()> {
        let Some(map) = config.as_object() else {
            return Ok(());
        };
        let context = format!("argument {}", self.name);
        assert_valid_keys(map, ARGUMENT_KEYS, &context)?;
        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        if let Some(default) = map.get("defaultValue") {
            self.set_default_value(default.clone())?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> &TypeExpr {
        &self.type_ref
    }

    pub fn set_type(&mut self, type_ref: &str) -> Result<()> {
        self.type_ref = TypeExpr::parse(type_ref)?;
        Ok(())
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Defaults must be scalars (string, number, boolean or null).
    pub fn set_default_value(&mut self, value: Value) -> Result<()> {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return Err(SchemaError::config(format!(
                "default value of argument {} must be a scalar, got {}",
                self.name,
                kind(&value)
            )));
        }
        self.default_value = Some(value);
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// The validated type reference.
    pub fn encoded_type(&self) -> Result<EncodedType> {
        EncodedType::from_expr(self.type_ref.clone())
    }

    pub fn validate(&self) -> Result<()> {
        self.encoded_type().map(|_| ())
    }

    pub fn signature(&self) -> String {
        let default = self.default_value.as_ref().map(Value::to_string);
        SignatureBuilder::new()
            .component("name", &self.name)
            .component("type", &self.type_ref.to_string())
            .optional("description", self.description.as_deref())
            .optional("default", default.as_deref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_string_config() {
        let arg = Argument::from_config("id", &json!("ID!")).unwrap();
        assert_eq!(arg.type_ref().to_string(), "ID!");
        assert!(arg.default_value().is_none());
    }

    #[test]
    fn test_from_map_config() {
        let arg = Argument::from_config(
            "limit",
            &json!({"type": "Int", "defaultValue": 10, "description": "Page size"}),
        )
        .unwrap();
        assert_eq!(arg.default_value(), Some(&json!(10)));
        assert_eq!(arg.description(), Some("Page size"));
    }

    #[test]
    fn test_invalid_config() {
        assert!(Argument::from_config("limit", &json!({"type": "Int", "max": 4})).is_err());
        assert!(Argument::from_config("limit", &json!({"description": "no type"})).is_err());
        assert!(Argument::from_config("bad-name", &json!("Int")).is_err());
        assert!(Argument::from_config("filter", &json!({"type": "Int", "defaultValue": [1]})).is_err());
    }

    #[test]
    fn test_signature_changes_with_default() {
        let mut arg = Argument::new("limit", "Int").unwrap();
        let before = arg.signature();
        assert_eq!(before, arg.signature());
        arg.set_default_value(json!(5)).unwrap();
        assert_ne!(before, arg.signature());
    }
}
