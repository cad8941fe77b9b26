//! Plugin pipeline.
//!
//! Plugins are referenced by identifier from the `plugins` map of a
//! component. Each plugin declares the capabilities it implements and each
//! component kind accepts a fixed set of capabilities; the registry checks
//! the pair before a plugin runs.
//!
//! # Built-in plugins
//!
//! | identifier | capabilities |
//! |------------|--------------|
//! | `paginateList` | ModelQuery, Query, SchemaUpdater |
//! | `sort` | ModelQuery, Query, SchemaUpdater |
//! | `firstResult` | ModelQuery, Query |
//! | `truncate` | Field, ModelField |

mod first_result;
mod paginate;
mod sort;
mod truncate;

pub use first_result::FirstResultPlugin;
pub use paginate::{DEFAULT_LIMIT, PAGE_INFO_TYPE, PaginatePlugin};
pub use sort::{SORT_DIRECTION_ENUM, SortPlugin};
pub use truncate::TruncatePlugin;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use loomql_core::{Pluraliser, Result, SchemaError, TypeExpr};
use serde_json::Value;
use tracing::trace;

use crate::models::ModelType;
use crate::schema::Schema;
use crate::types::{Field, InterfaceType, NamedType, ObjectType};

/// What a plugin can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Type,
    Interface,
    Field,
    Query,
    Mutation,
    ModelType,
    ModelQuery,
    ModelMutation,
    ModelField,
    SchemaUpdater,
}

/// The kind of component a plugin is being applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    ObjectType,
    Interface,
    TypeField,
    QueryField,
    MutationField,
    ModelType,
    ModelQuery,
    ModelMutation,
    ModelField,
}

impl ComponentKind {
    /// Capabilities a plugin needs at least one of to run on this component.
    pub fn accepted(self) -> &'static [Capability] {
        use Capability as C;
        match self {
            Self::ObjectType => &[C::Type],
            Self::Interface => &[C::Interface],
            Self::TypeField => &[C::Field],
            Self::QueryField => &[C::Query, C::Field],
            Self::MutationField => &[C::Mutation, C::Field],
            Self::ModelType => &[C::ModelType, C::Type],
            Self::ModelQuery => &[C::ModelQuery, C::Query, C::Field],
            Self::ModelMutation => &[C::ModelMutation, C::Mutation, C::Field],
            Self::ModelField => &[C::ModelField, C::Field],
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ObjectType => "object types",
            Self::Interface => "interfaces",
            Self::TypeField => "fields",
            Self::QueryField => "queries",
            Self::MutationField => "mutations",
            Self::ModelType => "model types",
            Self::ModelQuery => "model queries",
            Self::ModelMutation => "model mutations",
            Self::ModelField => "model fields",
        };
        f.write_str(label)
    }
}

/// The component a plugin is applied to.
pub enum PluginTarget<'a> {
    Type(&'a mut ObjectType),
    Interface(&'a mut InterfaceType),
    Field { owner: &'a str, field: &'a mut Field },
    Query(&'a mut Field),
    Mutation(&'a mut Field),
    ModelType(&'a mut ModelType),
    ModelQuery { model: &'a str, field: &'a mut Field },
    ModelMutation { model: &'a str, field: &'a mut Field },
    ModelField { model: &'a str, field: &'a mut Field },
}

impl PluginTarget<'_> {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Type(_) => ComponentKind::ObjectType,
            Self::Interface(_) => ComponentKind::Interface,
            Self::Field { .. } => ComponentKind::TypeField,
            Self::Query(_) => ComponentKind::QueryField,
            Self::Mutation(_) => ComponentKind::MutationField,
            Self::ModelType(_) => ComponentKind::ModelType,
            Self::ModelQuery { .. } => ComponentKind::ModelQuery,
            Self::ModelMutation { .. } => ComponentKind::ModelMutation,
            Self::ModelField { .. } => ComponentKind::ModelField,
        }
    }

    /// Human-readable component name, e.g. `Query.readArticles`.
    pub fn label(&self) -> String {
        match self {
            Self::Type(ty) => ty.name().to_string(),
            Self::Interface(ty) => ty.name().to_string(),
            Self::Field { owner, field } => format!("{owner}.{}", field.name()),
            Self::Query(field) | Self::ModelQuery { field, .. } => format!("Query.{}", field.name()),
            Self::Mutation(field) | Self::ModelMutation { field, .. } => {
                format!("Mutation.{}", field.name())
            }
            Self::ModelType(model) => model.name().to_string(),
            Self::ModelField { model, field } => format!("{model}.{}", field.name()),
        }
    }

    /// The field being decorated, for field-shaped components.
    pub fn field_mut(&mut self) -> Option<&mut Field> {
        match self {
            Self::Field { field, .. }
            | Self::Query(field)
            | Self::Mutation(field)
            | Self::ModelQuery { field, .. }
            | Self::ModelMutation { field, .. }
            | Self::ModelField { field, .. } => Some(&mut **field),
            Self::Type(_) | Self::Interface(_) | Self::ModelType(_) => None,
        }
    }
}

/// Read access to the schema under construction plus a sink for types a
/// plugin generates.
#[derive(Debug, Default)]
pub struct PluginContext {
    pluraliser: Pluraliser,
    type_fields: IndexMap<String, Vec<(String, TypeExpr)>>,
    added: Vec<NamedType>,
}

impl PluginContext {
    pub fn new(pluraliser: Pluraliser, type_fields: IndexMap<String, Vec<(String, TypeExpr)>>) -> Self {
        Self {
            pluraliser,
            type_fields,
            added: Vec::new(),
        }
    }

    pub fn pluraliser(&self) -> &Pluraliser {
        &self.pluraliser
    }

    /// Fields of an object or model type as they were when the plugin pass
    /// started.
    pub fn fields_of(&self, type_name: &str) -> Option<&[(String, TypeExpr)]> {
        self.type_fields.get(type_name).map(Vec::as_slice)
    }

    /// Queues a generated type. A later type with the same name replaces an
    /// earlier one.
    pub fn add_type(&mut self, ty: NamedType) {
        self.added.retain(|existing| existing.name() != ty.name());
        self.added.push(ty);
    }

    pub fn take_added(&mut self) -> Vec<NamedType> {
        std::mem::take(&mut self.added)
    }
}

/// A schema plugin.
pub trait SchemaPlugin: Send + Sync {
    fn identifier(&self) -> &str;

    fn capabilities(&self) -> &[Capability];

    /// Higher priorities run first on a component.
    fn priority(&self) -> i32 {
        0
    }

    fn apply(&self, _target: &mut PluginTarget<'_>, _context: &mut PluginContext, _config: &Value) -> Result<()> {
        Ok(())
    }

    /// Runs once per assembly for plugins with [`Capability::SchemaUpdater`]
    /// that are referenced anywhere in the schema.
    fn update_schema(&self, _schema: &mut Schema) -> Result<()> {
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Plugins by identifier.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Arc<dyn SchemaPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PaginatePlugin));
        registry.register(Arc::new(SortPlugin));
        registry.register(Arc::new(FirstResultPlugin));
        registry.register(Arc::new(TruncatePlugin));
        registry
    }

    /// Registers a plugin, replacing one with the same identifier.
    pub fn register(&mut self, plugin: Arc<dyn SchemaPlugin>) {
        self.plugins.insert(plugin.identifier().to_string(), plugin);
    }

    pub fn get(&self, identifier: &str) -> Result<Arc<dyn SchemaPlugin>> {
        self.plugins
            .get(identifier)
            .cloned()
            .ok_or_else(|| SchemaError::reference(format!("Plugin '{identifier}' is not registered")))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.plugins.contains_key(identifier)
    }

    /// Fails unless `plugin` has a capability accepted by `kind`.
    pub fn validate_plugin(plugin: &dyn SchemaPlugin, kind: ComponentKind, component: &str) -> Result<()> {
        if kind.accepted().iter().any(|c| plugin.has_capability(*c)) {
            return Ok(());
        }
        Err(SchemaError::plugin(
            plugin.identifier(),
            component,
            format!("plugin cannot be applied to {kind}"),
        ))
    }

    /// Resolves a component's plugin map, highest priority first. Plugins
    /// with equal priority keep declaration order.
    pub fn ordered(&self, plugins: &IndexMap<String, Value>) -> Result<Vec<(Arc<dyn SchemaPlugin>, Value)>> {
        let mut resolved = plugins
            .iter()
            .map(|(identifier, config)| Ok((self.get(identifier)?, config.clone())))
            .collect::<Result<Vec<_>>>()?;
        resolved.sort_by_key(|(plugin, _)| std::cmp::Reverse(plugin.priority()));
        Ok(resolved)
    }

    /// Applies every plugin in `plugins` to `target`.
    pub fn apply(
        &self,
        target: &mut PluginTarget<'_>,
        plugins: &IndexMap<String, Value>,
        context: &mut PluginContext,
    ) -> Result<()> {
        if plugins.is_empty() {
            return Ok(());
        }
        let component = target.label();
        for (plugin, config) in self.ordered(plugins)? {
            Self::validate_plugin(plugin.as_ref(), target.kind(), &component)?;
            trace!(plugin = %plugin.identifier(), component = %component, "Applying plugin");
            plugin
                .apply(target, context, &config)
                .map_err(|e| e.within_plugin(plugin.identifier(), &component))?;
        }
        Ok(())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}

/// The field a field plugin runs on, or a plugin error naming the
/// component when the target isn't a field.
pub(crate) fn target_field<'t>(target: &'t mut PluginTarget<'_>, plugin: &str) -> Result<&'t mut Field> {
    let label = target.label();
    target
        .field_mut()
        .ok_or_else(|| SchemaError::plugin(plugin, label, "plugin only applies to fields"))
}

/// Reads an optional non-negative integer from a plugin config.
pub(crate) fn config_int(config: &Value, key: &str, default: u64) -> Result<u64> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| SchemaError::config(format!("{key} must be a non-negative integer, got {value}"))),
    }
}
