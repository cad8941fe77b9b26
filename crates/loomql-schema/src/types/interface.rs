use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, optional_str};
use loomql_core::{Result, SchemaError, assert_valid_name};
use serde_json::Value;

use super::{Field, apply_plugins_config, fields_from_config};
use crate::resolver::ResolverRef;

const INTERFACE_KEYS: &[&str] = &["fields", "description", "typeResolver", "plugins"];

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    name: String,
    fields: IndexMap<String, Field>,
    description: Option<String>,
    type_resolver: Option<ResolverRef>,
    plugins: IndexMap<String, Value>,
}

impl InterfaceType {
    pub fn new(name: &str) -> Result<Self> {
        assert_valid_name(name, "Interface")?;
        Ok(Self {
            name: name.to_string(),
            fields: IndexMap::new(),
            description: None,
            type_resolver: None,
            plugins: IndexMap::new(),
        })
    }

    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        let mut interface = Self::new(name)?;
        interface.apply_config(config)?;
        Ok(interface)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let context = format!("interface {}", self.name);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, INTERFACE_KEYS, &context)?;

        if let Some(fields) = map.get("fields") {
            for field in fields_from_config(fields, &context)? {
                self.add_field(field);
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

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut IndexMap<String, Field> {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn add_field(&mut self, field: Field) {
        match self.fields.get_mut(field.name()) {
            Some(existing) => existing.merge_with(field),
            None => {
                self.fields.insert(field.name().to_string(), field);
            }
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn type_resolver(&self) -> Option<&ResolverRef> {
        self.type_resolver.as_ref()
    }

    pub fn set_type_resolver(&mut self, resolver: ResolverRef) {
        self.type_resolver = Some(resolver);
    }

    pub fn plugins(&self) -> &IndexMap<String, Value> {
        &self.plugins
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SchemaError::validation(format!(
                "Interface '{}' must declare at least one field",
                self.name
            )));
        }
        for field in self.fields.values() {
            field
                .validate()
                .map_err(|e| SchemaError::validation(format!("{}: {e}", self.name)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interface_config() {
        let interface = InterfaceType::from_config(
            "Node",
            &json!({"fields": {"id": "ID!"}, "typeResolver": "NodeResolver::resolveType"}),
        )
        .unwrap();
        assert_eq!(interface.fields().len(), 1);
        assert_eq!(interface.type_resolver().unwrap().class(), "NodeResolver");
        assert!(interface.validate().is_ok());

        assert!(InterfaceType::from_config("Node", &json!({"isInput": true})).is_err());
        assert!(InterfaceType::new("Empty").unwrap().validate().is_err());
    }
}
