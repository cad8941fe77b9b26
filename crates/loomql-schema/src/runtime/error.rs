//! Errors raised while resolving fields at request time.

use async_graphql::ErrorExtensions;

/// A resolver chain failure. Converted into a GraphQL error with a `code`
/// extension before it reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No resolver registered for {0}")]
    UnknownResolver(String),

    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("{field} returned an invalid value: {message}")]
    InvalidValue { field: String, message: String },

    #[error("{0}")]
    Failed(String),
}

impl ResolveError {
    pub fn unknown_resolver(reference: impl Into<String>) -> Self {
        Self::UnknownResolver(reference.into())
    }

    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownResolver(_) => "UNKNOWN_RESOLVER",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::Failed(_) => "RESOLVER_FAILED",
        }
    }

    pub fn into_graphql_error(self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}
