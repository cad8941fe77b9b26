use loomql_config::keys::{assert_valid_keys, config_map, optional_str};
use loomql_core::{Result, assert_valid_name};
use serde_json::Value;

use crate::resolver::ResolverRef;

const SCALAR_KEYS: &[&str] = &["description", "serialiser", "valueParser", "literalParser"];

/// A custom scalar. The serialiser and parsers are resolver references that
/// the runtime registry may map to conversion functions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    name: String,
    description: Option<String>,
    serialiser: Option<ResolverRef>,
    value_parser: Option<ResolverRef>,
    literal_parser: Option<ResolverRef>,
}

impl ScalarType {
    pub fn new(name: &str) -> Result<Self> {
        assert_valid_name(name, "Scalar")?;
        Ok(Self {
            name: name.to_string(),
            description: None,
            serialiser: None,
            value_parser: None,
            literal_parser: None,
        })
    }

    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        let mut scalar = Self::new(name)?;
        scalar.apply_config(config)?;
        Ok(scalar)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        if config.is_null() {
            return Ok(());
        }
        let context = format!("scalar {}", self.name);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, SCALAR_KEYS, &context)?;

        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        if let Some(resolver) = optional_str(map, "serialiser", &context)? {
            self.serialiser = Some(ResolverRef::parse(resolver)?);
        }
        if let Some(resolver) = optional_str(map, "valueParser", &context)? {
            self.value_parser = Some(ResolverRef::parse(resolver)?);
        }
        if let Some(resolver) = optional_str(map, "literalParser", &context)? {
            self.literal_parser = Some(ResolverRef::parse(resolver)?);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn serialiser(&self) -> Option<&ResolverRef> {
        self.serialiser.as_ref()
    }

    pub fn value_parser(&self) -> Option<&ResolverRef> {
        self.value_parser.as_ref()
    }

    pub fn literal_parser(&self) -> Option<&ResolverRef> {
        self.literal_parser.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_config() {
        let scalar = ScalarType::from_config(
            "DateTime",
            &json!({"description": "ISO 8601", "serialiser": "Dates::serialise"}),
        )
        .unwrap();
        assert_eq!(scalar.description(), Some("ISO 8601"));
        assert_eq!(scalar.serialiser().unwrap().method(), "serialise");
        assert!(scalar.value_parser().is_none());

        assert!(ScalarType::from_config("DateTime", &json!({"format": "iso"})).is_err());
    }
}
