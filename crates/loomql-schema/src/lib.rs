//! # loomql-schema
//!
//! Compiles declarative schema documents into a persisted GraphQL schema and
//! serves it back at request time.
//!
//! ## Pipeline
//!
//! ```text
//!   SchemaDocuments ──► Schema::apply_documents
//!                              │
//!                        Schema::build        (models, plugins, resolvers)
//!                              │
//!                        StorableSchema
//!                              │
//!                        ArtifactStore::persist   (TypeFactory per type)
//!                              │
//!   request ──► ArtifactRegistry::load ──► TypeRegistry ──► executable_schema
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Object, input, interface, union, enum and scalar components
//! - [`models`] - Model-backed types and their generated operations
//! - [`plugins`] - Plugin registry and the built-in plugins
//! - [`resolver`] - Resolver references and discovery
//! - [`schema`] - The assembly engine
//! - [`persistence`] - Type encoders, SDL printing and the artifact store
//! - [`runtime`] - Lazy type registry, resolver chains and the executable schema

pub mod models;
pub mod persistence;
pub mod plugins;
pub mod resolver;
pub mod runtime;
pub mod schema;
pub mod types;

pub use models::{InMemoryModel, ModelCatalog, ModelType, SchemaModel};
pub use persistence::{ArtifactStore, EncoderRegistry, PersistOutcome, SchemaArtifact, TypeFactory, print_sdl};
pub use plugins::{PluginRegistry, SchemaPlugin};
pub use resolver::{ResolverProvider, ResolverRef};
pub use runtime::{ArtifactRegistry, ResolveError, ResolveRequest, ResolverClass, ResolverRegistry, TypeRegistry};
pub use schema::{Schema, SchemaContext, SchemaState, StorableSchema};
pub use types::{Field, NamedType, ObjectType};
