use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, optional_str, string_list};
use loomql_core::{Result, SchemaError, assert_valid_name};
use serde_json::Value;

use super::apply_plugins_config;
use crate::resolver::ResolverRef;

const UNION_KEYS: &[&str] = &["types", "description", "typeResolver", "plugins"];

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    name: String,
    types: Vec<String>,
    description: Option<String>,
    type_resolver: Option<ResolverRef>,
    plugins: IndexMap<String, Value>,
}

impl UnionType {
    pub fn new(name: &str) -> Result<Self> {
        assert_valid_name(name, "Union")?;
        Ok(Self {
            name: name.to_string(),
            types: Vec::new(),
            description: None,
            type_resolver: None,
            plugins: IndexMap::new(),
        })
    }

    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        let mut union = Self::new(name)?;
        union.apply_config(config)?;
        Ok(union)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let context = format!("union {}", self.name);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, UNION_KEYS, &context)?;

        if let Some(types) = map.get("types") {
            for member in string_list(types, &format!("{context}.types"))? {
                self.add_type(&member)?;
            }
        }
        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        if let Some(resolver) = optional_str(map, "typeResolver", &context)? {
            self.type_resolver = Some(ResolverRef::parse(resolver)?);
        }
        if let Some(plugins) = map.get("plugins") {
            apply_plugins_config(&mut self.plugins, plugins, &context)?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member type names, in declaration order.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn add_type(&mut self, name: &str) -> Result<()> {
        assert_valid_name(name, "Union member")?;
        if !self.types.iter().any(|t| t == name) {
            self.types.push(name.to_string());
        }
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn type_resolver(&self) -> Option<&ResolverRef> {
        self.type_resolver.as_ref()
    }

    pub fn plugins(&self) -> &IndexMap<String, Value> {
        &self.plugins
    }

    pub fn validate(&self) -> Result<()> {
        if self.types.is_empty() {
            return Err(SchemaError::validation(format!(
                "Union '{}' must have at least one member type",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_union_config() {
        let union = UnionType::from_config(
            "SearchResult",
            &json!({"types": ["Article", "Author", "Article"]}),
        )
        .unwrap();
        assert_eq!(union.types(), &["Article".to_string(), "Author".to_string()]);
        assert!(union.validate().is_ok());
    }

    #[test]
    fn test_empty_union_fails() {
        let union = UnionType::from_config("Nothing", &json!({"types": []})).unwrap();
        assert!(union.validate().is_err());
    }
}
