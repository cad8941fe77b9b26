use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use loomql_config::ConfigMap;
use loomql_config::keys::{assert_valid_keys, kind, optional_str, string_list};
use loomql_core::{Pluraliser, Result, SchemaError, assert_valid_name};
use serde_json::Value;
use tracing::debug;

use super::operations::{ModelOperation, OperationConfig};
use super::{ModelRegistry, SchemaModel};
use crate::types::{Field, ObjectType, apply_plugins_config};

const MODEL_KEYS: &[&str] = &["fields", "excludeFields", "operations", "plugins", "description"];

/// Keys of a relation field config that configure the nested model rather
/// than the field itself.
const NESTED_MODEL_KEYS: &[&str] = &["fields", "excludeFields"];

const ALL: &str = "*";

/// A field of a model type. Relation fields carry the nested model type.
#[derive(Debug, Clone)]
pub struct ModelField {
    pub field: Field,
    pub property: Option<String>,
    pub nested: Option<ModelType>,
}

/// A schema type generated from a model class.
#[derive(Clone)]
pub struct ModelType {
    model: Arc<dyn SchemaModel>,
    name: String,
    description: Option<String>,
    fields: IndexMap<String, ModelField>,
    plugins: IndexMap<String, Value>,
    operations: IndexMap<String, Value>,
}

impl ModelType {
    /// Wraps `class`, adding the model's default and required fields.
    pub fn new(class: &str, registry: &mut ModelRegistry) -> Result<Self> {
        let model = registry.model_for(class)?;
        let name = model.type_name();
        assert_valid_name(&name, "Model type")?;

        let mut model_type = Self {
            model,
            name,
            description: None,
            fields: IndexMap::new(),
            plugins: IndexMap::new(),
            operations: IndexMap::new(),
        };

        for (field_name, type_ref) in model_type.model.default_fields() {
            model_type.add_scalar_field(&field_name, &Value::String(type_ref))?;
        }
        for field_name in model_type.model.required_fields() {
            if !model_type.fields.contains_key(&field_name) {
                model_type.add_scalar_field(&field_name, &Value::Null)?;
            }
        }
        Ok(model_type)
    }

    pub fn from_config(class: &str, config: &Value, registry: &mut ModelRegistry) -> Result<Self> {
        let mut model_type = Self::new(class, registry)?;
        model_type.apply_config(config, registry)?;
        Ok(model_type)
    }

    /// Applies a model config. `true` or `null` only registers the model.
    pub fn apply_config(&mut self, config: &Value, registry: &mut ModelRegistry) -> Result<()> {
        let map = match config {
            Value::Null | Value::Bool(true) => return Ok(()),
            Value::Object(map) => map,
            other => {
                return Err(SchemaError::config(format!(
                    "model {} config must be true or a map, got {}",
                    self.source_class(),
                    kind(other)
                )));
            }
        };
        let context = format!("model {}", self.source_class());
        assert_valid_keys(map, MODEL_KEYS, &context)?;

        if let Some(fields) = map.get("fields") {
            self.apply_fields_config(fields, registry)?;
        }
        if let Some(excluded) = map.get("excludeFields") {
            for name in string_list(excluded, &format!("{context}.excludeFields"))? {
                self.fields.shift_remove(&name);
            }
        }
        if let Some(operations) = map.get("operations") {
            self.apply_operations_config(operations)?;
        }
        if let Some(plugins) = map.get("plugins") {
            apply_plugins_config(&mut self.plugins, plugins, &context)?;
        }
        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        Ok(())
    }

    /// Adds fields from an explicit map or from `"*"` (every introspectable
    /// non-relation field with its inferred type).
    pub fn apply_fields_config(&mut self, fields: &Value, registry: &mut ModelRegistry) -> Result<()> {
        match fields {
            Value::String(s) if s == ALL => self.add_all_fields(),
            Value::Object(entries) => {
                for (name, config) in entries {
                    if name == ALL {
                        if config != &Value::Bool(false) {
                            self.add_all_fields()?;
                        }
                        continue;
                    }
                    self.add_configured_field(name, config, registry)?;
                }
                Ok(())
            }
            other => Err(SchemaError::config(format!(
                "model {}.fields must be \"*\" or a map, got {}",
                self.source_class(),
                kind(other)
            ))),
        }
    }

    fn add_all_fields(&mut self) -> Result<()> {
        let blacklist = self.model.blacklisted_fields();
        for name in self.model.all_fields() {
            if blacklist.contains(&name) || self.model.relation_for_field(&name).is_some() {
                continue;
            }
            if !self.fields.contains_key(&name) {
                self.add_scalar_field(&name, &Value::Null)?;
            }
        }
        Ok(())
    }

    fn add_configured_field(
        &mut self,
        name: &str,
        config: &Value,
        registry: &mut ModelRegistry,
    ) -> Result<()> {
        if config == &Value::Bool(false) {
            self.fields.shift_remove(name);
            return Ok(());
        }
        if self.model.blacklisted_fields().iter().any(|b| b == name) {
            return Err(SchemaError::config(format!(
                "Field '{name}' is blacklisted on model {} and cannot be added",
                self.source_class()
            )));
        }

        if self.model.relation_for_field(name).is_some() {
            self.add_relation_field(name, config, registry)
        } else {
            self.add_scalar_field(name, config)
        }
    }

    fn add_scalar_field(&mut self, name: &str, config: &Value) -> Result<()> {
        let mut field = Field::new(name, config)?;
        if field.type_ref().is_none() && field.type_as_model().is_none() {
            let inferred = self.model.type_for_field(field.name()).ok_or_else(|| {
                SchemaError::config(format!(
                    "Could not infer a type for field '{}' on model {}; declare it explicitly",
                    field.name(),
                    self.source_class()
                ))
            })?;
            field.set_type(&inferred, false)?;
        }
        self.finish_field(field, None);
        Ok(())
    }

    fn add_relation_field(&mut self, name: &str, config: &Value, registry: &mut ModelRegistry) -> Result<()> {
        let relation = self.model.relation_for_field(name).ok_or_else(|| {
            SchemaError::reference(format!("{} has no relation '{name}'", self.source_class()))
        })?;

        let (field_config, nested_config) = split_relation_config(config);
        let mut nested = ModelType::new(&relation.class, registry)?;
        nested.apply_config(&nested_config, registry)?;

        let mut field = Field::new(name, &field_config)?;
        if field.type_ref().is_none() {
            let type_ref = if relation.list {
                format!("[{}]", nested.name())
            } else {
                nested.name().to_string()
            };
            field.set_type(&type_ref, false)?;
        }
        field.set_resolved_model_class(relation.class.clone());
        self.finish_field(field, Some(nested));
        Ok(())
    }

    fn finish_field(&mut self, mut field: Field, nested: Option<ModelType>) {
        if field.resolver().is_none()
            && let Some(resolver) = self.model.default_resolver()
        {
            field.set_resolver(resolver);
        }
        let property = self.model.property_for_field(field.name());

        match self.fields.get_mut(field.name()) {
            Some(existing) => {
                existing.field.merge_with(field);
                if let Some(incoming) = nested {
                    match &mut existing.nested {
                        Some(current) => current.merge_with(incoming),
                        slot => *slot = Some(incoming),
                    }
                }
            }
            None => {
                self.fields.insert(
                    field.name().to_string(),
                    ModelField {
                        field,
                        property,
                        nested,
                    },
                );
            }
        }
    }

    /// Queues operations from `"*"` or a map of identifier to
    /// `config | true | false`. `false` removes a queued operation.
    pub fn apply_operations_config(&mut self, operations: &Value) -> Result<()> {
        match operations {
            Value::String(s) if s == ALL => {
                self.queue_all_operations();
                Ok(())
            }
            Value::Object(entries) => {
                for (identifier, config) in entries {
                    match config {
                        Value::Bool(false) if identifier == ALL => self.operations.clear(),
                        Value::Bool(false) => {
                            self.operations.shift_remove(identifier);
                        }
                        Value::Bool(true) | Value::Null if identifier == ALL => {
                            self.queue_all_operations()
                        }
                        Value::Bool(true) | Value::Null => {
                            self.operations
                                .entry(identifier.clone())
                                .or_insert_with(|| Value::Object(ConfigMap::new()));
                        }
                        Value::Object(_) => {
                            OperationConfig::from_config(identifier, config)?;
                            self.operations.insert(identifier.clone(), config.clone());
                        }
                        other => {
                            return Err(SchemaError::config(format!(
                                "model {}.operations.{identifier} must be true, false or a map, got {}",
                                self.source_class(),
                                kind(other)
                            )));
                        }
                    }
                }
                Ok(())
            }
            other => Err(SchemaError::config(format!(
                "model {}.operations must be \"*\" or a map, got {}",
                self.source_class(),
                kind(other)
            ))),
        }
    }

    fn queue_all_operations(&mut self) {
        for identifier in self.model.operation_identifiers() {
            self.operations
                .entry(identifier)
                .or_insert_with(|| Value::Object(ConfigMap::new()));
        }
    }

    /// Instantiates every queued operation. Operations whose creator has
    /// nothing to offer for this model are left out.
    pub fn operations(&self, pluraliser: &Pluraliser) -> Result<Vec<ModelOperation>> {
        let mut operations = Vec::with_capacity(self.operations.len());
        for (identifier, config) in &self.operations {
            let creator = self.model.operation_creator(identifier).ok_or_else(|| {
                SchemaError::reference(format!(
                    "Model {} has no operation '{identifier}'",
                    self.source_class()
                ))
            })?;
            let config = OperationConfig::from_config(identifier, config)?;
            match creator.create_operation(self, &config, pluraliser)? {
                Some(mut operation) => {
                    operation.set_disabled_plugins(config.disabled_plugins);
                    operations.push(operation);
                }
                None => debug!(model = %self.name(), operation = %identifier, "Operation not applicable, skipped"),
            }
        }
        Ok(operations)
    }

    /// Types produced alongside this model: the model's own extra types and
    /// the input types its operations need.
    pub fn extra_types(&self, pluraliser: &Pluraliser) -> Result<Vec<ObjectType>> {
        let mut types = self.model.extra_types();
        for operation in self.operations(pluraliser)? {
            types.extend(operation.extra_types().iter().cloned());
        }
        Ok(types)
    }

    /// Every nested model type reachable through relation fields.
    pub fn nested_models(&self) -> Vec<ModelType> {
        let mut nested = Vec::new();
        for model_field in self.fields.values() {
            if let Some(inner) = &model_field.nested {
                nested.extend(inner.nested_models());
                nested.push(inner.clone());
            }
        }
        nested
    }

    /// Combines fields, plugins and queued operations of another wrapper of
    /// the same class.
    pub fn merge_with(&mut self, other: ModelType) {
        for (_, model_field) in other.fields {
            let ModelField { field, nested, .. } = model_field;
            self.finish_field(field, nested);
        }
        for (identifier, config) in other.plugins {
            self.plugins.insert(identifier, config);
        }
        for (identifier, config) in other.operations {
            self.operations.entry(identifier).or_insert(config);
        }
        if other.description.is_some() {
            self.description = other.description;
        }
    }

    pub fn model(&self) -> &Arc<dyn SchemaModel> {
        &self.model
    }

    pub fn source_class(&self) -> &str {
        self.model.source_class()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &IndexMap<String, ModelField> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut IndexMap<String, ModelField> {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name).map(|f| &f.field)
    }

    pub fn plugins(&self) -> &IndexMap<String, Value> {
        &self.plugins
    }

    /// Adds a plugin unless one with the same identifier is already set.
    pub fn add_default_plugin(&mut self, identifier: &str, config: Value) {
        if !self.plugins.contains_key(identifier) {
            self.plugins.insert(identifier.to_string(), config);
        }
    }

    /// Identifiers of the queued operations.
    pub fn operation_identifiers(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// The plain object type this model graduates into.
    pub fn to_object_type(&self) -> Result<ObjectType> {
        let mut object = ObjectType::new(&self.name)?;
        if let Some(description) = &self.description {
            object.set_description(description.clone());
        }
        for (identifier, config) in &self.plugins {
            object.add_plugin(identifier.clone(), config.clone());
        }
        for model_field in self.fields.values() {
            object.add_field(model_field.field.clone());
        }
        Ok(object)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("class", &self.source_class())
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Splits a relation field config into the field part and the nested model
/// part.
fn split_relation_config(config: &Value) -> (Value, Value) {
    let Value::Object(map) = config else {
        return (Value::Null, Value::Null);
    };
    let mut field = ConfigMap::new();
    let mut nested = ConfigMap::new();
    for (key, value) in map {
        if NESTED_MODEL_KEYS.contains(&key.as_str()) {
            nested.insert(key.clone(), value.clone());
        } else {
            field.insert(key.clone(), value.clone());
        }
    }
    (Value::Object(field), Value::Object(nested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InMemoryModel, ModelCatalog};
    use serde_json::json;

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(Arc::new(ModelCatalog::new(vec![
            InMemoryModel::new("app.Article")
                .field("Title", "String")
                .field("Views", "Int")
                .field("Secret", "String")
                .relation("Author", "app.Author", false)
                .blacklist("Secret"),
            InMemoryModel::new("app.Author")
                .field("Name", "String")
                .field("Email", "String"),
        ])));
        registry
    }

    #[test]
    fn test_all_fields() {
        let mut registry = registry();
        let model = ModelType::from_config("app.Article", &json!({"fields": "*"}), &mut registry).unwrap();
        let names: Vec<_> = model.fields().keys().cloned().collect();
        assert_eq!(names, vec!["id", "title", "views"]);
        assert_eq!(model.field("views").unwrap().type_ref().unwrap().to_string(), "Int");
        assert_eq!(model.fields()["title"].property.as_deref(), Some("Title"));
        assert!(model.field("title").unwrap().resolver().is_some());
    }

    #[test]
    fn test_exclude_fields() {
        let mut registry = registry();
        let model = ModelType::from_config(
            "app.Article",
            &json!({"fields": "*", "excludeFields": ["views"]}),
            &mut registry,
        )
        .unwrap();
        assert!(model.field("views").is_none());
        assert!(model.field("title").is_some());
    }

    #[test]
    fn test_blacklisted_field_is_fatal() {
        let mut registry = registry();
        let err = ModelType::from_config("app.Article", &json!({"fields": {"secret": true}}), &mut registry)
            .unwrap_err();
        assert!(err.to_string().contains("blacklisted"));
    }

    #[test]
    fn test_relation_field_builds_nested_model() {
        let mut registry = registry();
        let model = ModelType::from_config(
            "app.Article",
            &json!({"fields": {"title": true, "author": {"fields": {"name": true}, "description": "Writer"}}}),
            &mut registry,
        )
        .unwrap();
        let author = &model.fields()["author"];
        assert_eq!(author.field.type_ref().unwrap().to_string(), "Author");
        assert_eq!(author.field.description(), Some("Writer"));
        let nested = author.nested.as_ref().unwrap();
        assert_eq!(nested.name(), "Author");
        assert!(nested.field("name").is_some());
        assert!(nested.field("email").is_none());
        assert_eq!(model.nested_models().len(), 1);
    }

    #[test]
    fn test_relation_defaults_to_default_fields() {
        let mut registry = registry();
        let model = ModelType::from_config("app.Article", &json!({"fields": {"author": true}}), &mut registry)
            .unwrap();
        let nested = model.fields()["author"].nested.as_ref().unwrap();
        assert_eq!(nested.fields().keys().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_unknown_field_needs_type() {
        let mut registry = registry();
        let err = ModelType::from_config("app.Article", &json!({"fields": {"wordCount": true}}), &mut registry)
            .unwrap_err();
        assert!(err.to_string().contains("Could not infer a type"));

        let model = ModelType::from_config(
            "app.Article",
            &json!({"fields": {"wordCount": "Int"}}),
            &mut registry,
        )
        .unwrap();
        assert!(model.field("wordCount").is_some());
    }

    #[test]
    fn test_operation_toggling() {
        let mut registry = registry();
        let mut model = ModelType::from_config("app.Article", &json!({"operations": "*"}), &mut registry).unwrap();
        assert_eq!(
            model.operation_identifiers().collect::<Vec<_>>(),
            vec!["read", "readOne", "create", "update", "delete"]
        );

        model
            .apply_config(&json!({"operations": {"read": false}}), &mut registry)
            .unwrap();
        assert!(!model.operation_identifiers().any(|id| id == "read"));

        let operations = model.operations(&Pluraliser::default()).unwrap();
        assert!(operations.iter().all(|op| op.field().name() != "readArticles"));
    }

    #[test]
    fn test_invalid_keys() {
        let mut registry = registry();
        let err = ModelType::from_config("app.Article", &json!({"colour": 1}), &mut registry).unwrap_err();
        assert!(err.to_string().contains("invalid keys in config"));

        let err = ModelType::from_config(
            "app.Article",
            &json!({"operations": {"read": {"limit": 3}}}),
            &mut registry,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid keys in config"));
    }

    #[test]
    fn test_unknown_operation() {
        let mut registry = registry();
        let model = ModelType::from_config(
            "app.Article",
            &json!({"operations": {"publish": true}}),
            &mut registry,
        )
        .unwrap();
        let err = model.operations(&Pluraliser::default()).unwrap_err();
        assert!(matches!(err, SchemaError::Reference(_)));
    }
}
