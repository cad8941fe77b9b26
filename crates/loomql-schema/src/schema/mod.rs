//! Schema assembly engine.
//!
//! A [`Schema`] collects components from configuration documents and builder
//! calls, then [`Schema::process`] runs the passes that turn it into a
//! [`StorableSchema`]:
//!
//! 1. model classes referenced as field types are resolved to type names
//! 2. model operations are expanded into `Query` / `Mutation` fields
//! 3. plugins are applied (schema updaters first)
//! 4. class and field maps are written into the [`SchemaContext`]
//! 5. models graduate into object types and every field without a resolver
//!    gets one
//!
//! Processing consumes the schema, so nothing can be added afterwards.

mod context;
mod storable;

pub use context::{FieldMapping, SchemaContext};
pub use storable::StorableSchema;

use std::sync::Arc;

use indexmap::IndexMap;
use loomql_config::keys::{assert_valid_keys, config_map, kind};
use loomql_config::{ConfigMap, SchemaDocuments, deep_merge};
use loomql_core::{Pluraliser, Result, SchemaError};
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::models::{ModelCreator, ModelRegistry, ModelType, OperationKind};
use crate::plugins::{Capability, PluginContext, PluginRegistry, PluginTarget, SchemaPlugin};
use crate::resolver::{ResolverDiscovery, ResolverProvider, ResolverRef};
use crate::types::{EnumType, Field, InterfaceType, NamedType, ObjectType, ScalarType, UnionType};

pub const QUERY_TYPE: &str = "Query";
pub const MUTATION_TYPE: &str = "Mutation";

const SCHEMA_KEYS: &[&str] = &[
    "types",
    "queries",
    "mutations",
    "models",
    "interfaces",
    "unions",
    "enums",
    "scalars",
    "config",
];

const CONFIG_KEYS: &[&str] = &["pluraliser", "defaultResolver", "modelConfig"];

const MODEL_CONFIG_KEYS: &[&str] = &["plugins", "operations"];

/// Progress of a schema through [`Schema::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaState {
    Configured,
    TypesResolved,
    ModelsExpanded,
    PluginsApplied,
    Mapped,
    Finalized,
}

/// A schema under assembly, identified by its schema key.
pub struct Schema {
    key: String,
    state: SchemaState,
    types: IndexMap<String, ObjectType>,
    interfaces: IndexMap<String, InterfaceType>,
    unions: IndexMap<String, UnionType>,
    enums: IndexMap<String, EnumType>,
    scalars: IndexMap<String, ScalarType>,
    /// Model types keyed by source class
    models: IndexMap<String, ModelType>,
    query: ObjectType,
    mutation: ObjectType,
    config: Value,
    context: SchemaContext,
    model_registry: ModelRegistry,
    plugins: PluginRegistry,
    discovery: ResolverDiscovery,
}

impl Schema {
    /// An empty schema with the built-in plugins registered.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: SchemaState::Configured,
            types: IndexMap::new(),
            interfaces: IndexMap::new(),
            unions: IndexMap::new(),
            enums: IndexMap::new(),
            scalars: IndexMap::new(),
            models: IndexMap::new(),
            query: ObjectType::root(QUERY_TYPE),
            mutation: ObjectType::root(MUTATION_TYPE),
            config: Value::Object(ConfigMap::new()),
            context: SchemaContext::new(),
            model_registry: ModelRegistry::new(),
            plugins: PluginRegistry::with_defaults(),
            discovery: ResolverDiscovery::new(),
        }
    }

    pub fn with_model_creator(mut self, creator: Arc<dyn ModelCreator>) -> Self {
        self.model_registry.register(creator);
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn SchemaPlugin>) -> Self {
        self.plugins.register(plugin);
        self
    }

    pub fn with_resolver_provider(mut self, provider: Arc<dyn ResolverProvider>) -> Self {
        self.discovery.add(provider);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> SchemaState {
        self.state
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    pub fn query(&self) -> &ObjectType {
        &self.query
    }

    pub fn mutation(&self) -> &ObjectType {
        &self.mutation
    }

    pub fn types(&self) -> &IndexMap<String, ObjectType> {
        &self.types
    }

    pub fn get_type(&self, name: &str) -> Option<&ObjectType> {
        match name {
            QUERY_TYPE => Some(&self.query),
            MUTATION_TYPE => Some(&self.mutation),
            _ => self.types.get(name),
        }
    }

    pub fn enums(&self) -> &IndexMap<String, EnumType> {
        &self.enums
    }

    /// Model types keyed by source class.
    pub fn models(&self) -> &IndexMap<String, ModelType> {
        &self.models
    }

    /// Whether any component already uses `name`.
    pub fn has_type(&self, name: &str) -> bool {
        self.get_type(name).is_some()
            || self.interfaces.contains_key(name)
            || self.unions.contains_key(name)
            || self.enums.contains_key(name)
            || self.scalars.contains_key(name)
            || self.models.values().any(|m| m.name() == name)
    }

    /// Adds an object type, merging into a same-named one.
    pub fn add_type(&mut self, ty: ObjectType) {
        let target = match ty.name() {
            QUERY_TYPE => Some(&mut self.query),
            MUTATION_TYPE => Some(&mut self.mutation),
            name => self.types.get_mut(name),
        };
        match target {
            Some(existing) => existing.merge_with(ty),
            None => {
                self.types.insert(ty.name().to_string(), ty);
            }
        }
    }

    /// Adds an interface, replacing a same-named one. Plugins rely on this to
    /// swap in their own definition; documents merge through `apply_config`.
    pub fn add_interface(&mut self, interface: InterfaceType) {
        self.interfaces.insert(interface.name().to_string(), interface);
    }

    /// Adds a union, replacing a same-named one.
    pub fn add_union(&mut self, union: UnionType) {
        self.unions.insert(union.name().to_string(), union);
    }

    /// Adds an enum, replacing a same-named one.
    pub fn add_enum(&mut self, ty: EnumType) {
        self.enums.insert(ty.name().to_string(), ty);
    }

    /// Adds a scalar, replacing a same-named one.
    pub fn add_scalar(&mut self, scalar: ScalarType) {
        self.scalars.insert(scalar.name().to_string(), scalar);
    }

    pub fn add_query(&mut self, field: Field) {
        self.query.add_field(field);
    }

    pub fn add_mutation(&mut self, field: Field) {
        self.mutation.add_field(field);
    }

    /// Adds a model type, merging into one wrapping the same class.
    pub fn add_model(&mut self, model: ModelType) {
        match self.models.get_mut(model.source_class()) {
            Some(existing) => existing.merge_with(model),
            None => {
                self.models.insert(model.source_class().to_string(), model);
            }
        }
    }

    /// Returns the model type for `class`, creating it with default fields on
    /// first use.
    pub fn find_or_make_model(&mut self, class: &str) -> Result<&mut ModelType> {
        if !self.models.contains_key(class) {
            let model = ModelType::new(class, &mut self.model_registry)?;
            self.models.insert(class.to_string(), model);
        }
        self.models
            .get_mut(class)
            .ok_or_else(|| SchemaError::reference(format!("No model found for {class}")))
    }

    fn add_type_from_plugin(&mut self, ty: NamedType) {
        match ty {
            NamedType::Object(object) => self.add_type(object),
            NamedType::Interface(interface) => self.add_interface(interface),
            NamedType::Union(union) => self.add_union(union),
            NamedType::Enum(ty) => self.add_enum(ty),
            NamedType::Scalar(scalar) => self.add_scalar(scalar),
        }
    }

    /// Applies every document loaded for this schema's key, in load order.
    pub fn apply_documents(&mut self, documents: &SchemaDocuments) -> Result<()> {
        for document in documents.component_documents(&self.key) {
            self.apply_config(&document)?;
        }
        Ok(())
    }

    /// Applies one configuration document.
    ///
    /// Same-named components merge into what earlier documents declared.
    pub fn apply_config(&mut self, document: &Value) -> Result<()> {
        let context = format!("schema {}", self.key);
        let map = config_map(document, &context)?;
        assert_valid_keys(map, SCHEMA_KEYS, &context)?;

        if let Some(config) = map.get("config") {
            self.apply_schema_config(config)?;
        }

        for (name, config) in section(map, "types", &context)? {
            let existing = match name.as_str() {
                QUERY_TYPE => Some(&mut self.query),
                MUTATION_TYPE => Some(&mut self.mutation),
                other => self.types.get_mut(other),
            };
            match existing {
                Some(ty) => ty.apply_config(config)?,
                None => {
                    self.types.insert(name.clone(), ObjectType::from_config(name, config)?);
                }
            }
        }
        for (signature, config) in section(map, "queries", &context)? {
            self.query.add_field(Field::new(signature, config)?);
        }
        for (signature, config) in section(map, "mutations", &context)? {
            self.mutation.add_field(Field::new(signature, config)?);
        }
        for (name, config) in section(map, "interfaces", &context)? {
            match self.interfaces.get_mut(name) {
                Some(interface) => interface.apply_config(config)?,
                None => self.add_interface(InterfaceType::from_config(name, config)?),
            }
        }
        for (name, config) in section(map, "unions", &context)? {
            match self.unions.get_mut(name) {
                Some(union) => union.apply_config(config)?,
                None => self.add_union(UnionType::from_config(name, config)?),
            }
        }
        for (name, config) in section(map, "enums", &context)? {
            match self.enums.get_mut(name) {
                Some(ty) => ty.apply_config(config)?,
                None => self.add_enum(EnumType::from_config(name, config)?),
            }
        }
        for (name, config) in section(map, "scalars", &context)? {
            match self.scalars.get_mut(name) {
                Some(scalar) => scalar.apply_config(config)?,
                None => self.add_scalar(ScalarType::from_config(name, config)?),
            }
        }
        for (class, config) in section(map, "models", &context)? {
            match self.models.get_mut(class) {
                Some(model) => model.apply_config(config, &mut self.model_registry)?,
                None => {
                    let model = ModelType::from_config(class, config, &mut self.model_registry)?;
                    self.models.insert(class.clone(), model);
                }
            }
        }

        debug!(
            schema = %self.key,
            types = self.types.len(),
            models = self.models.len(),
            queries = self.query.fields().len(),
            "Applied schema document"
        );
        Ok(())
    }

    fn apply_schema_config(&mut self, config: &Value) -> Result<()> {
        let context = format!("schema {} config", self.key);
        let map = config_map(config, &context)?;
        assert_valid_keys(map, CONFIG_KEYS, &context)?;

        if let Some(pluraliser) = map.get("pluraliser") {
            self.context.set_pluraliser(Pluraliser::from_config(pluraliser)?);
        }
        match map.get("defaultResolver") {
            None => {}
            Some(Value::String(resolver)) => {
                self.context.set_default_resolver(Some(ResolverRef::parse(resolver)?));
            }
            Some(Value::Bool(false) | Value::Null) => self.context.set_default_resolver(None),
            Some(other) => {
                return Err(SchemaError::config(format!(
                    "{context}.defaultResolver must be a Class::method string or false, got {}",
                    kind(other)
                )));
            }
        }
        if let Some(model_config) = map.get("modelConfig") {
            let entries = config_map(model_config, &format!("{context}.modelConfig"))?;
            for (identifier, defaults) in entries {
                let defaults_context = format!("{context}.modelConfig.{identifier}");
                assert_valid_keys(config_map(defaults, &defaults_context)?, MODEL_CONFIG_KEYS, &defaults_context)?;
            }
        }

        deep_merge(&mut self.config, config.clone());
        Ok(())
    }

    /// Runs every assembly pass and returns the finalized schema.
    pub fn process(mut self) -> Result<StorableSchema> {
        info!(schema = %self.key, "Processing schema");

        self.resolve_model_types()?;
        self.advance(SchemaState::TypesResolved);

        self.expand_models()?;
        self.advance(SchemaState::ModelsExpanded);

        self.apply_plugins()?;
        self.advance(SchemaState::PluginsApplied);

        self.build_maps();
        self.advance(SchemaState::Mapped);

        self.finalize()
    }

    /// Processes and validates in one step.
    pub fn build(self) -> Result<StorableSchema> {
        let storable = self.process()?;
        storable.validate()?;
        Ok(storable)
    }

    fn advance(&mut self, next: SchemaState) {
        debug!(schema = %self.key, from = ?self.state, to = ?next, "Schema state transition");
        self.state = next;
    }

    /// Pass 1: nested models join the registry and fields typed by a model
    /// class get the model's type name.
    fn resolve_model_types(&mut self) -> Result<()> {
        let nested: Vec<ModelType> = self.models.values().flat_map(ModelType::nested_models).collect();
        for model in nested {
            self.add_model(model);
        }

        let mut referenced: IndexMap<String, String> = IndexMap::new();
        let registry = &mut self.model_registry;

        for ty in self.types.values_mut() {
            for field in ty.fields_mut().values_mut() {
                resolve_field_model(field, registry, &mut referenced)?;
            }
        }
        for interface in self.interfaces.values_mut() {
            for field in interface.fields_mut().values_mut() {
                resolve_field_model(field, registry, &mut referenced)?;
            }
        }
        for root in [&mut self.query, &mut self.mutation] {
            for field in root.fields_mut().values_mut() {
                resolve_field_model(field, registry, &mut referenced)?;
            }
        }
        for model in self.models.values_mut() {
            for model_field in model.fields_mut().values_mut() {
                resolve_field_model(&mut model_field.field, registry, &mut referenced)?;
            }
        }

        for (class, type_name) in referenced {
            if !self.models.contains_key(&class) {
                debug!(class = %class, type_name = %type_name, "Registering model referenced by a field");
                self.find_or_make_model(&class)?;
            }
        }
        Ok(())
    }

    /// Pass 2: model defaults from `modelConfig`, then operations routed into
    /// the root types.
    fn expand_models(&mut self) -> Result<()> {
        let pluraliser = self.context.pluraliser().clone();
        let classes: Vec<String> = self.models.keys().cloned().collect();

        for class in classes {
            let Some(model) = self.models.get_mut(&class) else {
                continue;
            };
            let defaults = self
                .config
                .get("modelConfig")
                .and_then(|c| c.get(model.model().identifier()))
                .cloned()
                .unwrap_or(Value::Null);

            if let Some(plugins) = defaults.get("plugins").and_then(Value::as_object) {
                for (identifier, config) in plugins {
                    if let Some(config) = plugin_default(config) {
                        model.add_default_plugin(identifier, config);
                    }
                }
            }

            let extra_types = model.extra_types(&pluraliser)?;
            let operations = model.operations(&pluraliser)?;
            let model_name = model.name().to_string();

            for mut operation in operations {
                let operation_defaults = defaults
                    .get("operations")
                    .and_then(|ops| ops.get(operation.identifier()))
                    .and_then(|op| op.get("plugins"))
                    .and_then(Value::as_object);
                if let Some(plugins) = operation_defaults {
                    for (identifier, config) in plugins {
                        if operation.is_plugin_disabled(identifier) {
                            continue;
                        }
                        if let Some(config) = plugin_default(config) {
                            operation.field_mut().add_default_plugin(identifier, config);
                        }
                    }
                }

                let (kind, field) = operation.into_parts();
                debug!(
                    model = %model_name,
                    field = %field.name(),
                    root = %kind.root_type(),
                    "Expanded model operation"
                );
                match kind {
                    OperationKind::Query => self.query.add_field(field),
                    OperationKind::Mutation => self.mutation.add_field(field),
                }
            }
            for ty in extra_types {
                self.add_type(ty);
            }
        }
        Ok(())
    }

    /// Pass 3: schema updaters once each, then component and field plugins.
    fn apply_plugins(&mut self) -> Result<()> {
        let registry = self.plugins.clone();

        for identifier in self.referenced_plugins() {
            let plugin = registry.get(&identifier)?;
            if plugin.has_capability(Capability::SchemaUpdater) {
                trace!(plugin = %identifier, "Running schema updater");
                plugin
                    .update_schema(self)
                    .map_err(|e| e.within_plugin(&identifier, &format!("schema {}", self.key)))?;
            }
        }

        let mut context = PluginContext::new(self.context.pluraliser().clone(), self.field_catalog());

        for ty in self.types.values_mut() {
            let plugins = ty.plugins().clone();
            registry.apply(&mut PluginTarget::Type(&mut *ty), &plugins, &mut context)?;
            let owner = ty.name().to_string();
            for field in ty.fields_mut().values_mut() {
                let plugins = field.plugins().clone();
                registry.apply(&mut PluginTarget::Field { owner: &owner, field }, &plugins, &mut context)?;
            }
        }
        for interface in self.interfaces.values_mut() {
            let plugins = interface.plugins().clone();
            registry.apply(&mut PluginTarget::Interface(&mut *interface), &plugins, &mut context)?;
            let owner = interface.name().to_string();
            for field in interface.fields_mut().values_mut() {
                let plugins = field.plugins().clone();
                registry.apply(&mut PluginTarget::Field { owner: &owner, field }, &plugins, &mut context)?;
            }
        }
        for model in self.models.values_mut() {
            let plugins = model.plugins().clone();
            registry.apply(&mut PluginTarget::ModelType(&mut *model), &plugins, &mut context)?;
            let name = model.name().to_string();
            for model_field in model.fields_mut().values_mut() {
                let plugins = model_field.field.plugins().clone();
                let mut target = PluginTarget::ModelField {
                    model: &name,
                    field: &mut model_field.field,
                };
                registry.apply(&mut target, &plugins, &mut context)?;
            }
        }
        for field in self.query.fields_mut().values_mut() {
            let plugins = field.plugins().clone();
            match field.operation_model().map(str::to_string) {
                Some(model) => {
                    registry.apply(&mut PluginTarget::ModelQuery { model: &model, field }, &plugins, &mut context)?
                }
                None => registry.apply(&mut PluginTarget::Query(field), &plugins, &mut context)?,
            }
        }
        for field in self.mutation.fields_mut().values_mut() {
            let plugins = field.plugins().clone();
            match field.operation_model().map(str::to_string) {
                Some(model) => registry.apply(
                    &mut PluginTarget::ModelMutation { model: &model, field },
                    &plugins,
                    &mut context,
                )?,
                None => registry.apply(&mut PluginTarget::Mutation(field), &plugins, &mut context)?,
            }
        }

        for ty in context.take_added() {
            trace!(type_name = %ty.name(), kind = ty.kind(), "Adding plugin type");
            self.add_type_from_plugin(ty);
        }
        Ok(())
    }

    /// Every plugin identifier used anywhere, in first-use order.
    fn referenced_plugins(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = Vec::new();
        let mut collect = |plugins: &IndexMap<String, Value>| {
            for identifier in plugins.keys() {
                if !identifiers.contains(identifier) {
                    identifiers.push(identifier.clone());
                }
            }
        };

        for ty in self.types.values() {
            collect(ty.plugins());
            ty.fields().values().for_each(|f| collect(f.plugins()));
        }
        for interface in self.interfaces.values() {
            collect(interface.plugins());
            interface.fields().values().for_each(|f| collect(f.plugins()));
        }
        for model in self.models.values() {
            collect(model.plugins());
            model.fields().values().for_each(|f| collect(f.field.plugins()));
        }
        self.query.fields().values().for_each(|f| collect(f.plugins()));
        self.mutation.fields().values().for_each(|f| collect(f.plugins()));
        identifiers
    }

    /// Field names and types per object and model type, for plugins.
    fn field_catalog(&self) -> IndexMap<String, Vec<(String, loomql_core::TypeExpr)>> {
        let mut catalog = IndexMap::new();
        for ty in self.types.values() {
            catalog.insert(ty.name().to_string(), typed_fields(ty.fields().values()));
        }
        for model in self.models.values() {
            let fields = typed_fields(model.fields().values().map(|f| &f.field));
            catalog.insert(model.name().to_string(), fields);
        }
        catalog
    }

    /// Pass 4: class to type name, and type field to related type and
    /// property.
    fn build_maps(&mut self) {
        for (class, model) in &self.models {
            self.context.add_class_type(class, model.name());
        }

        for model in self.models.values() {
            for (name, model_field) in model.fields() {
                let related_type = match &model_field.nested {
                    Some(nested) => Some(nested.name().to_string()),
                    None => model_field
                        .field
                        .resolved_model_class()
                        .and_then(|class| self.context.type_for_class(class))
                        .map(str::to_string),
                };
                let mapping = FieldMapping {
                    related_type,
                    property: model_field.property.clone(),
                };
                self.context.add_field_mapping(model.name(), name, mapping);
            }
        }

        for ty in self.types.values().filter(|ty| !ty.is_input()) {
            for (name, field) in ty.fields() {
                let related_type = field
                    .resolved_model_class()
                    .and_then(|class| self.context.type_for_class(class))
                    .map(str::to_string)
                    .or_else(|| {
                        let leaf = field.type_ref()?.named_type();
                        self.types.contains_key(leaf).then(|| leaf.to_string())
                    });
                self.context.add_field_mapping(
                    ty.name(),
                    name,
                    FieldMapping {
                        related_type,
                        property: None,
                    },
                );
            }
        }
    }

    /// Pass 5: models graduate into types, resolvers are assigned and the
    /// storable schema is emitted.
    fn finalize(mut self) -> Result<StorableSchema> {
        let models = std::mem::take(&mut self.models);
        for model in models.values() {
            let object = model.to_object_type()?;
            trace!(class = %model.source_class(), type_name = %object.name(), "Model graduated to type");
            self.add_type(object);
        }

        let default_resolver = self.context.default_resolver().cloned();
        for ty in self
            .types
            .values_mut()
            .chain([&mut self.query, &mut self.mutation])
        {
            assign_resolvers(ty, &self.discovery, default_resolver.as_ref())?;
        }

        let mut types = Vec::with_capacity(
            2 + self.types.len() + self.interfaces.len() + self.unions.len() + self.enums.len() + self.scalars.len(),
        );
        types.push(NamedType::Object(self.query));
        if !self.mutation.fields().is_empty() {
            types.push(NamedType::Object(self.mutation));
        }
        types.extend(self.types.into_values().map(NamedType::Object));
        types.extend(self.interfaces.into_values().map(NamedType::Interface));
        types.extend(self.unions.into_values().map(NamedType::Union));
        types.extend(self.enums.into_values().map(NamedType::Enum));
        types.extend(self.scalars.into_values().map(NamedType::Scalar));

        info!(schema = %self.key, types = types.len(), "Schema finalized");
        Ok(StorableSchema::new(self.key, types, self.context))
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("plugins", &self.plugins)
            .finish()
    }
}

/// Entries of an optional top-level section.
fn section<'a>(map: &'a ConfigMap, key: &str, context: &str) -> Result<impl Iterator<Item = (&'a String, &'a Value)>> {
    let entries = match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(config_map(value, &format!("{context}.{key}"))?),
    };
    Ok(entries.into_iter().flatten())
}

/// `true`/`null` enable a default plugin with an empty config; `false`
/// leaves it out.
fn plugin_default(config: &Value) -> Option<Value> {
    match config {
        Value::Bool(false) => None,
        Value::Bool(true) | Value::Null => Some(Value::Object(ConfigMap::new())),
        other => Some(other.clone()),
    }
}

fn resolve_field_model(
    field: &mut Field,
    registry: &mut ModelRegistry,
    referenced: &mut IndexMap<String, String>,
) -> Result<()> {
    if !field.needs_model_resolution() {
        return Ok(());
    }
    let Some(expr) = field.type_as_model().cloned() else {
        return Ok(());
    };
    let class = expr.named_type().to_string();
    let model = registry.model_for(&class)?;
    let type_name = model.type_name();

    trace!(field = %field.name(), class = %class, type_name = %type_name, "Resolved model type");
    field.set_type_expr(expr.with_named_type(&type_name));
    if field.resolved_model_class().is_none() {
        field.set_resolved_model_class(class.clone());
    }
    referenced.insert(class, type_name);
    Ok(())
}

fn typed_fields<'a>(fields: impl Iterator<Item = &'a Field>) -> Vec<(String, loomql_core::TypeExpr)> {
    fields
        .filter_map(|field| Some((field.name().to_string(), field.type_ref()?.clone())))
        .collect()
}

/// Resolver discovery for output fields without a resolver: providers,
/// then the type's field resolver, then the schema default.
fn assign_resolvers(
    ty: &mut ObjectType,
    discovery: &ResolverDiscovery,
    default_resolver: Option<&ResolverRef>,
) -> Result<()> {
    if ty.is_input() {
        return Ok(());
    }
    let type_name = ty.name().to_string();
    let field_resolver = ty.field_resolver().cloned();

    for field in ty.fields_mut().values_mut() {
        if field.resolver().is_some() {
            continue;
        }
        let resolver = discovery
            .discover(&type_name, field.name())
            .or_else(|| field_resolver.clone())
            .or_else(|| default_resolver.cloned())
            .ok_or_else(|| {
                SchemaError::reference(format!(
                    "No resolver found for {type_name}.{}: register a resolver provider or set config.defaultResolver",
                    field.name()
                ))
            })?;
        trace!(type_name = %type_name, field = %field.name(), resolver = %resolver, "Assigned resolver");
        field.set_resolver(resolver);
    }
    Ok(())
}
