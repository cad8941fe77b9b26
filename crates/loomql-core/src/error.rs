use thiserror::Error;

/// Build errors raised while assembling, validating or persisting a schema.
///
/// Every variant is fatal for the build that raised it. There is no warning
/// level and no partial schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid name: {0}")]
    Naming(String),

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Plugin '{plugin}' failed on {component}: {message}")]
    Plugin {
        plugin: String,
        component: String,
        message: String,
    },

    #[error("Could not parse '{fragment}': {message}")]
    Parse { fragment: String, message: String },

    #[error("Schema validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new Naming error
    pub fn naming(message: impl Into<String>) -> Self {
        Self::Naming(message.into())
    }

    /// Create a new Reference error
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference(message.into())
    }

    /// Create a new Plugin error
    pub fn plugin(
        plugin: impl Into<String>,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a new Parse error
    pub fn parse(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Re-raise this error as a plugin failure, keeping the original message.
    ///
    /// Errors that already carry plugin context are returned unchanged so that
    /// nested plugin calls don't stack prefixes.
    pub fn within_plugin(self, plugin: &str, component: &str) -> Self {
        match self {
            err @ Self::Plugin { .. } => err,
            other => Self::plugin(plugin, component, other.to_string()),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Naming(_) => ErrorCategory::Naming,
            Self::Reference(_) => ErrorCategory::Reference,
            Self::Plugin { .. } => ErrorCategory::Plugin,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Persistence,
        }
    }
}

/// Error categories for classification in logs and CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Naming,
    Reference,
    Plugin,
    Parse,
    Validation,
    Persistence,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Naming => write!(f, "naming"),
            Self::Reference => write!(f, "reference"),
            Self::Plugin => write!(f, "plugin"),
            Self::Parse => write!(f, "parse"),
            Self::Validation => write!(f, "validation"),
            Self::Persistence => write!(f, "persistence"),
        }
    }
}

/// Convenience result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SchemaError::config("invalid keys in config: foo");
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid keys in config: foo"
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_parse_error_names_fragment() {
        let err = SchemaError::parse("foo(bar: String", "unbalanced parentheses");
        assert_eq!(
            err.to_string(),
            "Could not parse 'foo(bar: String': unbalanced parentheses"
        );
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_within_plugin_wraps_once() {
        let err = SchemaError::reference("No model found for Foo")
            .within_plugin("paginateList", "Query.readFoos");
        assert_eq!(
            err.to_string(),
            "Plugin 'paginateList' failed on Query.readFoos: Reference error: No model found for Foo"
        );

        let rewrapped = err.within_plugin("sort", "Query.other");
        assert!(matches!(
            rewrapped,
            SchemaError::Plugin { ref plugin, .. } if plugin == "paginateList"
        ));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Plugin.to_string(), "plugin");
        assert_eq!(ErrorCategory::Persistence.to_string(), "persistence");
    }
}
