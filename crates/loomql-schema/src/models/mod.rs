//! Model abstraction layer.
//!
//! A model wraps an external data class (an ORM entity, a record catalog)
//! behind [`SchemaModel`]. [`ModelCreator`]s decide which classes they can
//! wrap; the [`ModelRegistry`] owned by the assembly engine picks the first
//! applicable creator and memoizes the result per class.

mod memory;
mod model_type;
mod operations;

pub use memory::{InMemoryModel, ModelCatalog};
pub use model_type::{ModelField, ModelType};
pub use operations::{
    CreateCreator, DeleteCreator, ModelOperation, OperationConfig, OperationCreator, OperationKind,
    ReadCreator, ReadOneCreator, UpdateCreator, builtin_creator,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use loomql_core::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver::ResolverRef;
use crate::types::ObjectType;

/// A field of one model that points at another model class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelation {
    pub class: String,
    #[serde(default)]
    pub list: bool,
}

/// Introspection surface of a wrapped model class.
///
/// Field names are GraphQL field names; [`SchemaModel::property_for_field`]
/// maps them back to the property names of the underlying class.
pub trait SchemaModel: Send + Sync {
    /// Key under `config.modelConfig` holding defaults for this kind of model.
    fn identifier(&self) -> &str;

    fn source_class(&self) -> &str;

    /// GraphQL type name for the wrapped class.
    fn type_name(&self) -> String;

    fn has_field(&self, field: &str) -> bool;

    /// GraphQL type of a scalar field, if it can be inferred.
    fn type_for_field(&self, field: &str) -> Option<String>;

    /// Every introspectable field name.
    fn all_fields(&self) -> Vec<String>;

    fn property_for_field(&self, field: &str) -> Option<String> {
        self.has_field(field).then(|| field.to_string())
    }

    fn default_resolver(&self) -> Option<ResolverRef> {
        None
    }

    /// Fields added to every type built from this model, name to type.
    fn default_fields(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    /// Fields that must be present regardless of config.
    fn required_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// Field names that may never be exposed.
    fn blacklisted_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn relation_for_field(&self, _field: &str) -> Option<ModelRelation> {
        None
    }

    /// Operation identifiers enabled by `operations: "*"`.
    fn operation_identifiers(&self) -> Vec<String> {
        Vec::new()
    }

    fn operation_creator(&self, _identifier: &str) -> Option<Arc<dyn OperationCreator>> {
        None
    }

    /// Resolver used for an operation when its config names none.
    fn operation_resolver(&self, _identifier: &str) -> Option<ResolverRef> {
        None
    }

    /// Additional types the model always contributes.
    fn extra_types(&self) -> Vec<ObjectType> {
        Vec::new()
    }
}

/// Builds models for the classes it applies to.
pub trait ModelCreator: Send + Sync {
    fn applies_to(&self, class: &str) -> bool;

    fn create(&self, class: &str) -> Result<Arc<dyn SchemaModel>>;
}

/// Ordered model creators plus a per-class memo.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    creators: Vec<Arc<dyn ModelCreator>>,
    models: HashMap<String, Arc<dyn SchemaModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, creator: Arc<dyn ModelCreator>) {
        self.creators.push(creator);
    }

    /// Returns the model for `class`, creating it with the first applicable
    /// creator on first use.
    pub fn model_for(&mut self, class: &str) -> Result<Arc<dyn SchemaModel>> {
        if let Some(model) = self.models.get(class) {
            return Ok(Arc::clone(model));
        }

        let creator = self
            .creators
            .iter()
            .find(|creator| creator.applies_to(class))
            .ok_or_else(|| {
                SchemaError::reference(format!(
                    "No model found for {class}. Maybe the class does not exist?"
                ))
            })?;

        let model = creator.create(class)?;
        debug!(class = %class, type_name = %model.type_name(), "Created model");
        self.models.insert(class.to_string(), Arc::clone(&model));
        Ok(model)
    }

    pub fn has_model(&self, class: &str) -> bool {
        self.models.contains_key(class) || self.creators.iter().any(|c| c.applies_to(class))
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("creators", &self.creators.len())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCreator {
        catalog: ModelCatalog,
        created: AtomicUsize,
    }

    impl ModelCreator for CountingCreator {
        fn applies_to(&self, class: &str) -> bool {
            self.catalog.applies_to(class)
        }

        fn create(&self, class: &str) -> Result<Arc<dyn SchemaModel>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            self.catalog.create(class)
        }
    }

    #[test]
    fn test_model_for_memoizes() {
        let creator = Arc::new(CountingCreator {
            catalog: ModelCatalog::new(vec![InMemoryModel::new("app.Article").field("Title", "String")]),
            created: AtomicUsize::new(0),
        });
        let mut registry = ModelRegistry::new();
        registry.register(creator.clone());

        let first = registry.model_for("app.Article").unwrap();
        let second = registry.model_for("app.Article").unwrap();
        assert_eq!(first.type_name(), "Article");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(creator.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_model() {
        let mut registry = ModelRegistry::new();
        let err = registry.model_for("app.Missing").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Reference error: No model found for app.Missing. Maybe the class does not exist?"
        );
    }
}
