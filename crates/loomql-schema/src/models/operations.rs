//! Model operations and the built-in CRUD operation creators.

use std::sync::Arc;

use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, optional_str};
use loomql_core::{Pluraliser, Result, TypeExpr, is_builtin_scalar};
use serde_json::Value;

use super::model_type::ModelType;
use crate::resolver::ResolverRef;
use crate::types::{Argument, Field, ObjectType, apply_plugins_config};

const OPERATION_KEYS: &[&str] = &["name", "description", "plugins", "resolver"];

/// Which root type an operation is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn root_type(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

/// Parsed config of one queued operation.
#[derive(Debug, Clone, Default)]
pub struct OperationConfig {
    pub identifier: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub plugins: IndexMap<String, Value>,
    /// Plugins switched off with `false`, including built-in defaults.
    pub disabled_plugins: Vec<String>,
    pub resolver: Option<ResolverRef>,
}

impl OperationConfig {
    pub fn from_config(identifier: &str, config: &Value) -> Result<Self> {
        let mut parsed = Self {
            identifier: identifier.to_string(),
            ..Self::default()
        };
        if config.is_null() {
            return Ok(parsed);
        }

        let context = format!("operation {identifier}");
        let map = config_map(config, &context)?;
        assert_valid_keys(map, OPERATION_KEYS, &context)?;

        parsed.name = optional_str(map, "name", &context)?.map(str::to_string);
        parsed.description = optional_str(map, "description", &context)?.map(str::to_string);
        if let Some(resolver) = optional_str(map, "resolver", &context)? {
            parsed.resolver = Some(ResolverRef::parse(resolver)?);
        }
        if let Some(plugins) = map.get("plugins") {
            apply_plugins_config(&mut parsed.plugins, plugins, &context)?;
            if let Some(entries) = plugins.as_object() {
                parsed.disabled_plugins = entries
                    .iter()
                    .filter(|(_, config)| config == &&Value::Bool(false))
                    .map(|(identifier, _)| identifier.clone())
                    .collect();
            }
        }
        Ok(parsed)
    }
}

/// A materialized operation: the root field plus the types it needs.
#[derive(Debug, Clone)]
pub struct ModelOperation {
    identifier: String,
    kind: OperationKind,
    field: Field,
    extra_types: Vec<ObjectType>,
    disabled_plugins: Vec<String>,
}

impl ModelOperation {
    pub fn new(identifier: impl Into<String>, kind: OperationKind, field: Field) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            field,
            extra_types: Vec::new(),
            disabled_plugins: Vec::new(),
        }
    }

    pub fn with_extra_type(mut self, ty: ObjectType) -> Self {
        self.extra_types.push(ty);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn set_disabled_plugins(&mut self, plugins: Vec<String>) {
        self.disabled_plugins = plugins;
    }

    /// Whether the operation config switched `identifier` off, which also
    /// blocks defaults from `modelConfig`.
    pub fn is_plugin_disabled(&self, identifier: &str) -> bool {
        self.disabled_plugins.iter().any(|p| p == identifier)
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut Field {
        &mut self.field
    }

    pub fn extra_types(&self) -> &[ObjectType] {
        &self.extra_types
    }

    pub fn into_parts(self) -> (OperationKind, Field) {
        (self.kind, self.field)
    }
}

/// Turns a queued operation config into a [`ModelOperation`]. `None` means
/// the operation has nothing to offer for this model and is left out.
pub trait OperationCreator: Send + Sync {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>>;
}

/// Built-in creator for a CRUD identifier.
pub fn builtin_creator(identifier: &str) -> Option<Arc<dyn OperationCreator>> {
    match identifier {
        "read" => Some(Arc::new(ReadCreator)),
        "readOne" => Some(Arc::new(ReadOneCreator)),
        "create" => Some(Arc::new(CreateCreator)),
        "update" => Some(Arc::new(UpdateCreator)),
        "delete" => Some(Arc::new(DeleteCreator)),
        _ => None,
    }
}

/// `read{Plural}: [T!]!`, paginated by default.
pub struct ReadCreator;

impl OperationCreator for ReadCreator {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>> {
        let default_name = format!("read{}", pluraliser.pluralise(model.name()));
        let mut field = Field::with_type(
            config.name.as_deref().unwrap_or(&default_name),
            &format!("[{}!]!", model.name()),
        )?;
        field.add_plugin("paginateList", Value::Object(Default::default()));
        finish_operation(&mut field, model, config);
        Ok(Some(ModelOperation::new(&config.identifier, OperationKind::Query, field)))
    }
}

/// `readOne{T}(id: ID!): T`
pub struct ReadOneCreator;

impl OperationCreator for ReadOneCreator {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        _pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>> {
        let default_name = format!("readOne{}", model.name());
        let mut field = Field::with_type(config.name.as_deref().unwrap_or(&default_name), model.name())?;
        field.add_arg(Argument::new("id", "ID!")?);
        field.add_plugin("firstResult", Value::Object(Default::default()));
        finish_operation(&mut field, model, config);
        Ok(Some(ModelOperation::new(&config.identifier, OperationKind::Query, field)))
    }
}

/// `create{T}(input: {T}CreateInputType!): T`, left out when the model has
/// no writable scalar field.
pub struct CreateCreator;

impl OperationCreator for CreateCreator {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        _pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>> {
        let input = input_type(model, "Create", false)?;
        if input.fields().is_empty() {
            return Ok(None);
        }
        let default_name = format!("create{}", model.name());
        let mut field = Field::with_type(config.name.as_deref().unwrap_or(&default_name), model.name())?;
        field.add_arg(Argument::new("input", &format!("{}!", input.name()))?);
        finish_operation(&mut field, model, config);
        Ok(Some(
            ModelOperation::new(&config.identifier, OperationKind::Mutation, field).with_extra_type(input),
        ))
    }
}

/// `update{T}(input: {T}UpdateInputType!): T`
pub struct UpdateCreator;

impl OperationCreator for UpdateCreator {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        _pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>> {
        let input = input_type(model, "Update", true)?;
        let default_name = format!("update{}", model.name());
        let mut field = Field::with_type(config.name.as_deref().unwrap_or(&default_name), model.name())?;
        field.add_arg(Argument::new("input", &format!("{}!", input.name()))?);
        finish_operation(&mut field, model, config);
        Ok(Some(
            ModelOperation::new(&config.identifier, OperationKind::Mutation, field).with_extra_type(input),
        ))
    }
}

/// `delete{Plural}(ids: [ID!]!): [ID]`
pub struct DeleteCreator;

impl OperationCreator for DeleteCreator {
    fn create_operation(
        &self,
        model: &ModelType,
        config: &OperationConfig,
        pluraliser: &Pluraliser,
    ) -> Result<Option<ModelOperation>> {
        let default_name = format!("delete{}", pluraliser.pluralise(model.name()));
        let mut field = Field::with_type(config.name.as_deref().unwrap_or(&default_name), "[ID]")?;
        field.add_arg(Argument::new("ids", "[ID!]!")?);
        finish_operation(&mut field, model, config);
        Ok(Some(ModelOperation::new(&config.identifier, OperationKind::Mutation, field)))
    }
}

/// Applies the shared parts of an operation config.
fn finish_operation(field: &mut Field, model: &ModelType, config: &OperationConfig) {
    if let Some(description) = &config.description {
        field.set_description(description.clone());
    }
    for (identifier, plugin_config) in &config.plugins {
        field.add_plugin(identifier.clone(), plugin_config.clone());
    }
    for identifier in &config.disabled_plugins {
        field.remove_plugin(identifier);
    }
    let resolver = config
        .resolver
        .clone()
        .or_else(|| model.model().operation_resolver(&config.identifier));
    if let Some(resolver) = resolver {
        field.set_resolver(resolver);
    }
    field.set_resolved_model_class(model.source_class());
    field.set_operation_model(model.name());
}

/// Input type over every scalar field of the model. Update inputs start with
/// a required `id`; create inputs leave out `ID` fields.
fn input_type(model: &ModelType, suffix: &str, with_id: bool) -> Result<ObjectType> {
    let mut input = ObjectType::input(&format!("{}{suffix}InputType", model.name()))?;
    if with_id {
        input.add_field(Field::with_type("id", "ID!")?);
    }
    for model_field in model.fields().values() {
        if model_field.nested.is_some() {
            continue;
        }
        let Some(type_ref) = model_field.field.type_ref() else {
            continue;
        };
        let leaf = type_ref.named_type();
        if !is_builtin_scalar(leaf) || leaf == "ID" {
            continue;
        }
        let nullable = match type_ref {
            TypeExpr::NonNull(inner) => inner.as_ref().clone(),
            other => other.clone(),
        };
        let mut field = Field::named(model_field.field.name())?;
        field.set_type_expr(nullable);
        input.add_field(field);
    }
    Ok(input)
}
