//! Request-time side of a compiled schema.
//!
//! A persisted [`SchemaArtifact`](crate::persistence::SchemaArtifact) is
//! loaded once into an [`ArtifactRegistry`] and shared. Each request gets its
//! own [`TypeRegistry`], which constructs types from their factory entries on
//! first access. [`TypeRegistry::executable_schema`] wires the result to
//! `async-graphql`, dispatching fields through a [`ResolverRegistry`].

mod builtins;
mod error;
mod executable;
mod registry;
mod resolvers;
mod value;

pub use builtins::{DefaultResolver, FirstResult, Paginator, Sorter, Truncator};
pub use error::ResolveError;
pub use registry::{
    ArtifactRegistry, RuntimeArgument, RuntimeField, RuntimeKind, RuntimeType, TypeRegistry,
};
pub use resolvers::{
    AfterwareFn, MiddlewareFn, ResolveFn, ResolveFuture, ResolveRequest, ResolverChain,
    ResolverClass, ResolverRegistry,
};
