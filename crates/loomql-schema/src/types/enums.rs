use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, kind, optional_str};
use loomql_core::{Result, SchemaError, assert_valid_name};
use serde_json::Value;

const ENUM_KEYS: &[&str] = &["values", "description"];
const ENUM_VALUE_KEYS: &[&str] = &["value", "description", "deprecationReason"];

/// One enum member. `value` is what resolvers see; the key is what clients
/// send.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub value: Value,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    name: String,
    values: IndexMap<String, EnumValue>,
    description: Option<String>,
}

impl EnumType {
    pub fn new(name: &str) -> Result<Self> {
        assert_valid_name(name, "Enum")?;
        Ok(Self {
            name: name.to_string(),
            values: IndexMap::new(),
            description: None,
        })
    }

    /// Creates an enum whose values are their own names.
    pub fn with_values<I, S>(name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ty = Self::new(name)?;
        for value in values {
            ty.add_value(value.as_ref(), Value::String(value.as_ref().to_string()))?;
        }
        Ok(ty)
    }

    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        let mut ty = Self::new(name)?;
        ty.apply_config(config)?;
        Ok(ty)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let context = format!("enum {}", self.name);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, ENUM_KEYS, &context)?;

        match map.get("values") {
            None => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let name = item.as_str().ok_or_else(|| {
                        SchemaError::config(format!("{context}.values must only contain names"))
                    })?;
                    self.add_value(name, Value::String(name.to_string()))?;
                }
            }
            Some(Value::Object(entries)) => {
                for (name, entry) in entries {
                    self.apply_value_config(name, entry, &context)?;
                }
            }
            Some(other) => {
                return Err(SchemaError::config(format!(
                    "{context}.values must be a list or a map, got {}",
                    kind(other)
                )));
            }
        }

        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        Ok(())
    }

    fn apply_value_config(&mut self, name: &str, entry: &Value, context: &str) -> Result<()> {
        let Value::Object(map) = entry else {
            return self.add_value(name, entry.clone());
        };
        let value_context = format!("{context}.values.{name}");
        assert_valid_keys(map, ENUM_VALUE_KEYS, &value_context)?;

        let value = map
            .get("value")
            .cloned()
            .unwrap_or_else(|| Value::String(name.to_string()));
        self.add_value(name, value)?;

        if let Some(member) = self.values.get_mut(name) {
            member.description = optional_str(map, "description", &value_context)?.map(str::to_string);
            member.deprecation_reason =
                optional_str(map, "deprecationReason", &value_context)?.map(str::to_string);
        }
        Ok(())
    }

    pub fn add_value(&mut self, name: &str, value: Value) -> Result<()> {
        assert_valid_name(name, "Enum value")?;
        if matches!(name, "true" | "false" | "null") {
            return Err(SchemaError::naming(format!(
                "Enum value name '{name}' is reserved"
            )));
        }
        self.values.insert(
            name.to_string(),
            EnumValue {
                value,
                description: None,
                deprecation_reason: None,
            },
        );
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &IndexMap<String, EnumValue> {
        &self.values
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(SchemaError::validation(format!(
                "Enum '{}' must have at least one value",
                self.name
            )));
        }
        Ok(())
    }
}
