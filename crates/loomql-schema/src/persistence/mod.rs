//! Code generation and persistence.
//!
//! A finalized [`StorableSchema`](crate::schema::StorableSchema) is encoded
//! into one [`TypeFactory`] per type by the [`EncoderRegistry`], hashed and
//! written by the [`ArtifactStore`]. At request time the artifact is loaded
//! back and handed to the runtime registry without re-running assembly.

mod factory;
mod sdl;
mod store;

pub use factory::{
    ArgumentFactory, EncoderRegistry, EnumEncoder, EnumValueFactory, FieldFactory, InterfaceEncoder,
    ObjectEncoder, ScalarEncoder, TypeEncoder, TypeFactory, UnionEncoder,
};
pub use sdl::print_sdl;
pub use store::{ArtifactStore, CURRENT_POINTER, PersistOutcome, SchemaArtifact};
