use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use loomql_config::ConfigMap;
use loomql_core::{Result, SchemaError, TypeExpr};
use serde_json::Value;
use tracing::trace;

use crate::persistence::{ArtifactStore, FieldFactory, SchemaArtifact, TypeFactory};
use crate::resolver::ResolverRef;
use crate::schema::SchemaContext;

/// A loaded artifact with a name index. Shared read-only between requests.
#[derive(Debug)]
pub struct ArtifactRegistry {
    artifact: SchemaArtifact,
    context: Arc<SchemaContext>,
    index: HashMap<String, usize>,
}

impl ArtifactRegistry {
    pub fn new(artifact: SchemaArtifact) -> Self {
        let index = artifact
            .types
            .iter()
            .enumerate()
            .map(|(i, ty)| (ty.name().to_string(), i))
            .collect();
        Self {
            context: Arc::new(artifact.context.clone()),
            artifact,
            index,
        }
    }

    /// Loads the current artifact of `key` from the store.
    pub fn load(store: &ArtifactStore, key: &str) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::new(store.load(key)?)))
    }

    pub fn key(&self) -> &str {
        &self.artifact.key
    }

    pub fn hash(&self) -> &str {
        &self.artifact.hash
    }

    pub fn context(&self) -> &Arc<SchemaContext> {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.artifact.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifact.types.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.artifact.type_names()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn factory(&self, index: usize) -> Option<&TypeFactory> {
        self.artifact.types.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Object,
    InputObject,
    Interface,
    Union,
    Enum,
    Scalar,
}

#[derive(Debug, Clone)]
pub struct RuntimeArgument {
    pub name: String,
    pub type_ref: TypeExpr,
    pub description: Option<String>,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RuntimeField {
    pub name: String,
    pub type_ref: TypeExpr,
    pub description: Option<String>,
    pub args: Vec<RuntimeArgument>,
    pub resolver: Option<ResolverRef>,
    pub middleware: Vec<ResolverRef>,
    pub afterware: Vec<ResolverRef>,
    pub context: ConfigMap,
}

impl RuntimeField {
    fn from_factory(factory: &FieldFactory) -> Self {
        Self {
            name: factory.name.clone(),
            type_ref: factory.type_ref.expr().clone(),
            description: factory.description.clone(),
            args: factory
                .args
                .iter()
                .map(|arg| RuntimeArgument {
                    name: arg.name.clone(),
                    type_ref: arg.type_ref.expr().clone(),
                    description: arg.description.clone(),
                    default_value: arg.default_value.clone(),
                })
                .collect(),
            resolver: factory.resolver.clone(),
            middleware: factory.middleware.clone(),
            afterware: factory.afterware.clone(),
            context: factory.resolver_context.clone(),
        }
    }
}

/// A type constructed from its factory entry.
#[derive(Debug, Clone)]
pub struct RuntimeType {
    pub name: String,
    pub kind: RuntimeKind,
    pub description: Option<String>,
    pub fields: IndexMap<String, RuntimeField>,
    pub interfaces: Vec<String>,
    /// Union members
    pub possible_types: Vec<String>,
    /// Enum members with descriptions and deprecation reasons
    pub values: Vec<(String, Option<String>, Option<String>)>,
}

impl RuntimeType {
    fn from_factory(factory: &TypeFactory) -> Self {
        let mut ty = Self {
            name: factory.name().to_string(),
            kind: RuntimeKind::Scalar,
            description: factory.description().map(str::to_string),
            fields: factory
                .fields()
                .iter()
                .map(|f| (f.name.clone(), RuntimeField::from_factory(f)))
                .collect(),
            interfaces: Vec::new(),
            possible_types: Vec::new(),
            values: Vec::new(),
        };
        match factory {
            TypeFactory::Object {
                is_input, interfaces, ..
            } => {
                ty.kind = if *is_input {
                    RuntimeKind::InputObject
                } else {
                    RuntimeKind::Object
                };
                ty.interfaces = interfaces.clone();
            }
            TypeFactory::Interface { .. } => ty.kind = RuntimeKind::Interface,
            TypeFactory::Union { types, .. } => {
                ty.kind = RuntimeKind::Union;
                ty.possible_types = types.clone();
            }
            TypeFactory::Enum { values, .. } => {
                ty.kind = RuntimeKind::Enum;
                ty.values = values
                    .iter()
                    .map(|v| (v.name.clone(), v.description.clone(), v.deprecation_reason.clone()))
                    .collect();
            }
            TypeFactory::Scalar { .. } => {}
        }
        ty
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Option<&RuntimeField> {
        self.fields.get(name)
    }
}

/// Request-scoped view of an artifact. Types are constructed on first
/// access and memoized by index for the lifetime of this registry.
#[derive(Debug)]
pub struct TypeRegistry {
    artifact: Arc<ArtifactRegistry>,
    memo: Vec<OnceLock<Arc<RuntimeType>>>,
}

impl TypeRegistry {
    pub fn new(artifact: Arc<ArtifactRegistry>) -> Self {
        let memo = (0..artifact.len()).map(|_| OnceLock::new()).collect();
        Self { artifact, memo }
    }

    pub fn artifact(&self) -> &Arc<ArtifactRegistry> {
        &self.artifact
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.artifact.index_of(name).is_some()
    }

    pub fn get_type(&self, name: &str) -> Result<Arc<RuntimeType>> {
        let index = self.artifact.index_of(name).ok_or_else(|| {
            SchemaError::reference(format!(
                "Type '{name}' does not exist in schema '{}'",
                self.artifact.key()
            ))
        })?;
        let factory = self
            .artifact
            .factory(index)
            .ok_or_else(|| SchemaError::reference(format!("Type '{name}' has no factory entry")))?;

        let ty = self.memo[index].get_or_init(|| {
            trace!(schema = %self.artifact.key(), type_name = %name, "Constructing runtime type");
            Arc::new(RuntimeType::from_factory(factory))
        });
        Ok(Arc::clone(ty))
    }

    /// Number of types constructed so far.
    pub fn constructed(&self) -> usize {
        self.memo.iter().filter(|slot| slot.get().is_some()).count()
    }
}
