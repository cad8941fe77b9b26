//! # loomql-core
//!
//! Shared building blocks for the loomql schema compiler: the build error type,
//! the GraphQL identifier grammar and pluraliser, type references and content
//! signatures.

pub mod error;
pub mod naming;
pub mod signature;
pub mod type_ref;

pub use error::{ErrorCategory, Result, SchemaError};
pub use naming::{Pluraliser, assert_valid_name, is_valid_name};
pub use signature::{SignatureBuilder, content_hash};
pub use type_ref::{EncodedType, TypeExpr, is_builtin_scalar};
