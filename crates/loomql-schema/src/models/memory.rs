//! Declarative models described in a catalog file.
//!
//! ```toml
//! [[model]]
//! class = "app.Article"
//! blacklist = ["Secret"]
//!
//! [model.fields]
//! Title = "String"
//! Views = "Int"
//!
//! [model.relations]
//! Author = { class = "app.Author" }
//! ```

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use loomql_core::naming::{lowercase_first, short_class_name};
use loomql_core::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::operations::{OperationCreator, builtin_creator};
use super::{ModelCreator, ModelRelation, SchemaModel};
use crate::resolver::ResolverRef;

const ID_FIELD: &str = "id";
const ID_PROPERTY: &str = "ID";

fn default_operations() -> Vec<String> {
    ["read", "readOne", "create", "update", "delete"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// A model class declared by property name and GraphQL type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InMemoryModel {
    pub class: String,
    #[serde(default)]
    pub type_name: Option<String>,
    /// Property name to GraphQL type
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    #[serde(default)]
    pub relations: IndexMap<String, ModelRelation>,
    /// Operations enabled by `operations: "*"`
    #[serde(default = "default_operations")]
    pub operations: Vec<String>,
    /// Properties that may never be exposed
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Operation identifier to resolver
    #[serde(default)]
    pub resolvers: IndexMap<String, ResolverRef>,
}

impl InMemoryModel {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            type_name: None,
            fields: IndexMap::new(),
            relations: IndexMap::new(),
            operations: default_operations(),
            blacklist: Vec::new(),
            resolvers: IndexMap::new(),
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn field(mut self, property: impl Into<String>, type_ref: impl Into<String>) -> Self {
        self.fields.insert(property.into(), type_ref.into());
        self
    }

    pub fn relation(mut self, property: impl Into<String>, class: impl Into<String>, list: bool) -> Self {
        self.relations.insert(
            property.into(),
            ModelRelation {
                class: class.into(),
                list,
            },
        );
        self
    }

    pub fn blacklist(mut self, property: impl Into<String>) -> Self {
        self.blacklist.push(property.into());
        self
    }

    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = operations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_operation_resolver(mut self, operation: impl Into<String>, resolver: ResolverRef) -> Self {
        self.resolvers.insert(operation.into(), resolver);
        self
    }

    fn properties(&self) -> impl Iterator<Item = &String> {
        self.fields.keys().chain(self.relations.keys())
    }

    fn property_named(&self, field: &str) -> Option<&String> {
        self.properties().find(|property| lowercase_first(property) == field)
    }
}

impl SchemaModel for InMemoryModel {
    fn identifier(&self) -> &str {
        "memory"
    }

    fn source_class(&self) -> &str {
        &self.class
    }

    fn type_name(&self) -> String {
        self.type_name
            .clone()
            .unwrap_or_else(|| short_class_name(&self.class).to_string())
    }

    fn has_field(&self, field: &str) -> bool {
        field == ID_FIELD || self.property_named(field).is_some()
    }

    fn type_for_field(&self, field: &str) -> Option<String> {
        if field == ID_FIELD {
            return Some("ID!".to_string());
        }
        let property = self.property_named(field)?;
        self.fields.get(property).cloned()
    }

    fn all_fields(&self) -> Vec<String> {
        let mut fields = vec![ID_FIELD.to_string()];
        for property in self.properties() {
            let name = lowercase_first(property);
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
        fields
    }

    fn property_for_field(&self, field: &str) -> Option<String> {
        match self.property_named(field) {
            Some(property) => Some(property.clone()),
            None if field == ID_FIELD => Some(ID_PROPERTY.to_string()),
            None => None,
        }
    }

    fn default_resolver(&self) -> Option<ResolverRef> {
        Some(ResolverRef::new("DefaultResolver", "resolve"))
    }

    fn default_fields(&self) -> IndexMap<String, String> {
        IndexMap::from([(ID_FIELD.to_string(), "ID!".to_string())])
    }

    fn blacklisted_fields(&self) -> Vec<String> {
        self.blacklist.iter().map(|p| lowercase_first(p)).collect()
    }

    fn relation_for_field(&self, field: &str) -> Option<ModelRelation> {
        let property = self.property_named(field)?;
        self.relations.get(property).cloned()
    }

    fn operation_identifiers(&self) -> Vec<String> {
        self.operations.clone()
    }

    fn operation_creator(&self, identifier: &str) -> Option<Arc<dyn OperationCreator>> {
        builtin_creator(identifier)
    }

    fn operation_resolver(&self, identifier: &str) -> Option<ResolverRef> {
        self.resolvers.get(identifier).cloned()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "model")]
    models: Vec<InMemoryModel>,
}

/// A set of [`InMemoryModel`]s, usable as a [`ModelCreator`].
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: IndexMap<String, Arc<InMemoryModel>>,
}

impl ModelCatalog {
    pub fn new(models: Vec<InMemoryModel>) -> Self {
        let mut catalog = Self::default();
        for model in models {
            catalog.add(model);
        }
        catalog
    }

    /// Adds a model, replacing any earlier model for the same class.
    pub fn add(&mut self, model: InMemoryModel) {
        self.models.insert(model.class.clone(), Arc::new(model));
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| SchemaError::config(format!("invalid model catalog: {e}")))?;
        Ok(Self::new(file.models))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        debug!(path = %path.display(), models = catalog.len(), "Loaded model catalog");
        Ok(catalog)
    }

    /// Folds another catalog in; later models win per class.
    pub fn extend(&mut self, other: ModelCatalog) {
        self.models.extend(other.models);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}

impl ModelCreator for ModelCatalog {
    fn applies_to(&self, class: &str) -> bool {
        self.models.contains_key(class)
    }

    fn create(&self, class: &str) -> Result<Arc<dyn SchemaModel>> {
        let model = self.models.get(class).ok_or_else(|| {
            SchemaError::reference(format!("No model found for {class}. Maybe the class does not exist?"))
        })?;
        Ok(Arc::clone(model) as Arc<dyn SchemaModel>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> InMemoryModel {
        InMemoryModel::new("app.Article")
            .field("Title", "String")
            .field("Views", "Int")
            .field("Secret", "String")
            .relation("Author", "app.Author", false)
            .blacklist("Secret")
    }

    #[test]
    fn test_introspection() {
        let model = article();
        assert_eq!(model.type_name(), "Article");
        assert_eq!(model.all_fields(), vec!["id", "title", "views", "secret", "author"]);
        assert_eq!(model.type_for_field("views").as_deref(), Some("Int"));
        assert_eq!(model.type_for_field("author"), None);
        assert_eq!(model.property_for_field("title").as_deref(), Some("Title"));
        assert_eq!(model.property_for_field("id").as_deref(), Some("ID"));
        assert_eq!(model.blacklisted_fields(), vec!["secret"]);
        assert_eq!(model.relation_for_field("author").unwrap().class, "app.Author");
        assert!(!model.has_field("missing"));
    }

    #[test]
    fn test_explicit_type_name() {
        let model = InMemoryModel::new("app.Post").with_type_name("BlogPost");
        assert_eq!(model.type_name(), "BlogPost");
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog = ModelCatalog::from_toml(
            r#"
[[model]]
class = "app.Article"
operations = ["read"]

[model.fields]
Title = "String"

[model.relations]
Author = { class = "app.Author" }

[model.resolvers]
read = "Articles::all"

[[model]]
class = "app.Author"
fields = { Name = "String" }
"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.applies_to("app.Author"));
        assert!(!catalog.applies_to("app.Comment"));

        let model = catalog.create("app.Article").unwrap();
        assert_eq!(model.operation_identifiers(), vec!["read"]);
        assert_eq!(model.operation_resolver("read").unwrap().to_string(), "Articles::all");
        assert!(!model.relation_for_field("author").unwrap().list);
    }

    #[test]
    fn test_catalog_rejects_bad_resolver() {
        let err = ModelCatalog::from_toml(
            r#"
[[model]]
class = "app.Article"
resolvers = { read = "all" }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid model catalog"));
    }
}
