use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, optional_bool, optional_str, string_list};
use loomql_core::{Result, SchemaError, SignatureBuilder, assert_valid_name};
use serde_json::Value;

use super::{Field, apply_plugins_config, fields_from_config};
use crate::resolver::ResolverRef;

const OBJECT_KEYS: &[&str] = &[
    "fields",
    "description",
    "interfaces",
    "isInput",
    "plugins",
    "fieldResolver",
];

/// An object type or, with `is_input`, an input object type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, Field>,
    description: Option<String>,
    interfaces: Vec<String>,
    is_input: bool,
    plugins: IndexMap<String, Value>,
    field_resolver: Option<ResolverRef>,
}

impl ObjectType {
    pub fn new(name: &str) -> Result<Self> {
        assert_valid_name(name, "Type")?;
        Ok(Self {
            name: name.to_string(),
            fields: IndexMap::new(),
            description: None,
            interfaces: Vec::new(),
            is_input: false,
            plugins: IndexMap::new(),
            field_resolver: None,
        })
    }

    /// A root operation type (`Query`, `Mutation`).
    pub(crate) fn root(name: &'static str) -> Self {
        Self {
            name: name.to_string(),
            fields: IndexMap::new(),
            description: None,
            interfaces: Vec::new(),
            is_input: false,
            plugins: IndexMap::new(),
            field_resolver: None,
        }
    }

    pub fn input(name: &str) -> Result<Self> {
        let mut ty = Self::new(name)?;
        ty.is_input = true;
        Ok(ty)
    }

    pub fn from_config(name: &str, config: &Value) -> Result<Self> {
        let mut ty = Self::new(name)?;
        ty.apply_config(config)?;
        Ok(ty)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let context = format!("type {}", self.name);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, OBJECT_KEYS, &context)?;

        if let Some(is_input) = optional_bool(map, "isInput", &context)? {
            self.is_input = is_input;
        }
        if let Some(fields) = map.get("fields") {
            for field in fields_from_config(fields, &context)? {
                self.add_field(field);
            }
        }
        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        if let Some(interfaces) = map.get("interfaces") {
            for interface in string_list(interfaces, &format!("{context}.interfaces"))? {
                self.add_interface(&interface)?;
            }
        }
        if let Some(plugins) = map.get("plugins") {
            apply_plugins_config(&mut self.plugins, plugins, &context)?;
        }
        if let Some(resolver) = optional_str(map, "fieldResolver", &context)? {
            self.field_resolver = Some(ResolverRef::parse(resolver)?);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_input(&self) -> bool {
        self.is_input
    }

    pub fn set_input(&mut self, is_input: bool) {
        self.is_input = is_input;
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

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// Adds a field, merging into an existing field of the same name.
    pub fn add_field(&mut self, field: Field) {
        match self.fields.get_mut(field.name()) {
            Some(existing) => existing.merge_with(field),
            None => {
                self.fields.insert(field.name().to_string(), field);
            }
        }
    }

    /// Replaces any existing field of the same name.
    pub fn replace_field(&mut self, field: Field) {
        self.fields.insert(field.name().to_string(), field);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        self.fields.shift_remove(name)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn add_interface(&mut self, name: &str) -> Result<()> {
        assert_valid_name(name, "Interface")?;
        if !self.interfaces.iter().any(|i| i == name) {
            self.interfaces.push(name.to_string());
        }
        Ok(())
    }

    pub fn plugins(&self) -> &IndexMap<String, Value> {
        &self.plugins
    }

    pub fn add_plugin(&mut self, identifier: impl Into<String>, config: Value) {
        self.plugins.insert(identifier.into(), config);
    }

    pub fn field_resolver(&self) -> Option<&ResolverRef> {
        self.field_resolver.as_ref()
    }

    pub fn set_field_resolver(&mut self, resolver: ResolverRef) {
        self.field_resolver = Some(resolver);
    }

    /// Merges a same-named type built elsewhere: fields and plugins are
    /// combined, scalar properties from `other` win when set.
    pub fn merge_with(&mut self, other: ObjectType) {
        for (_, field) in other.fields {
            self.add_field(field);
        }
        for (identifier, config) in other.plugins {
            self.plugins.insert(identifier, config);
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.field_resolver.is_some() {
            self.field_resolver = other.field_resolver;
        }
        if other.is_input {
            self.is_input = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SchemaError::validation(format!(
                "{} '{}' must declare at least one field",
                if self.is_input { "Input type" } else { "Type" },
                self.name
            )));
        }
        for field in self.fields.values() {
            field
                .validate()
                .map_err(|e| SchemaError::validation(format!("{}: {e}", self.name)))?;
            if self.is_input && !field.args().is_empty() {
                return Err(SchemaError::validation(format!(
                    "Input type field '{}.{}' cannot declare arguments",
                    self.name,
                    field.name()
                )));
            }
        }
        Ok(())
    }

    pub fn signature(&self) -> String {
        let fields = self.fields.values().map(Field::signature);
        SignatureBuilder::new()
            .component("name", &self.name)
            .component("input", if self.is_input { "1" } else { "0" })
            .optional("description", self.description.as_deref())
            .sorted("interfaces", &self.interfaces)
            .sorted("fields", fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config() {
        let ty = ObjectType::from_config(
            "Article",
            &json!({
                "description": "An article",
                "interfaces": "Node",
                "fields": {
                    "id": "ID!",
                    "title(length: Int)": {"type": "String", "plugins": {"truncate": true}}
                },
                "fieldResolver": "ArticleResolver::resolveField"
            }),
        )
        .unwrap();
        assert_eq!(ty.fields().len(), 2);
        assert_eq!(ty.interfaces(), &["Node".to_string()]);
        assert_eq!(ty.field_resolver().unwrap().method(), "resolveField");
        assert!(ty.field("title").unwrap().argument("length").is_some());
        assert!(ty.validate().is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        let err = ObjectType::from_config("Article", &json!({"feilds": {}})).unwrap_err();
        assert!(err.to_string().contains("invalid keys in config for type Article: feilds"));
    }

    #[test]
    fn test_empty_type_fails_validation() {
        let ty = ObjectType::new("Empty").unwrap();
        assert!(matches!(ty.validate(), Err(SchemaError::Validation(_))));
    }

    #[test]
    fn test_merge_combines_fields_and_plugins() {
        let mut a = ObjectType::from_config(
            "A",
            &json!({"description": "first", "fields": {"x": "String", "y": "Int"}}),
        )
        .unwrap();
        let b = ObjectType::from_config(
            "A",
            &json!({
                "description": "second",
                "fields": {"y": "String", "z": "Boolean"},
                "plugins": {"p": true}
            }),
        )
        .unwrap();
        a.merge_with(b);

        assert_eq!(a.fields().keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        // first-seen field keeps its type
        assert_eq!(a.field("y").unwrap().type_ref().unwrap().to_string(), "Int");
        assert!(a.plugins().contains_key("p"));
        assert_eq!(a.description(), Some("second"));
    }

    #[test]
    fn test_input_fields_reject_arguments() {
        let ty = ObjectType::from_config(
            "ArticleInput",
            &json!({"isInput": true, "fields": {"title(x: Int)": "String"}}),
        )
        .unwrap();
        assert!(ty.validate().is_err());
    }
}
