//! Type references.
//!
//! A type reference is the wrapper chain around a single named leaf, written in
//! SDL form (`[Article!]!`). [`TypeExpr`] is the loose form used while a leaf may
//! still name a model class (`[App\Model\Article]`); [`EncodedType`] is the
//! validated form whose leaf is a GraphQL name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::naming::is_valid_name;

/// The built-in scalar names every schema can reference without declaring them.
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

/// Returns true if `name` is one of the GraphQL built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// A parsed type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    /// Parses a type reference. The leaf may be any token without
    /// brackets, `!`, commas or whitespace.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        Self::parse_inner(trimmed).map_err(|message| SchemaError::parse(input, message))
    }

    fn parse_inner(s: &str) -> std::result::Result<Self, String> {
        if s.is_empty() {
            return Err("type reference is empty".into());
        }

        if let Some(inner) = s.strip_suffix('!') {
            let inner = Self::parse_inner(inner.trim_end())?;
            if matches!(inner, Self::NonNull(_)) {
                return Err("duplicate non-null marker".into());
            }
            return Ok(Self::NonNull(Box::new(inner)));
        }

        if let Some(rest) = s.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| "unbalanced list brackets".to_string())?;
            return Ok(Self::List(Box::new(Self::parse_inner(inner.trim())?)));
        }

        if s.contains(['[', ']', '!', ',', '(', ')'])
            || s.chars().any(char::is_whitespace)
        {
            return Err(format!("'{s}' is not a single named type"));
        }

        Ok(Self::Named(s.to_string()))
    }

    /// The named leaf of the wrapper chain.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    /// Returns the same wrapper chain around a different leaf.
    pub fn with_named_type(&self, name: &str) -> Self {
        match self {
            Self::Named(_) => Self::Named(name.to_string()),
            Self::List(inner) => Self::List(Box::new(inner.with_named_type(name))),
            Self::NonNull(inner) => Self::NonNull(Box::new(inner.with_named_type(name))),
        }
    }

    /// Whether the outermost wrapper is non-null.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Whether the type is a list once the outer non-null is removed.
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A validated type reference whose leaf is a GraphQL name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncodedType(TypeExpr);

impl EncodedType {
    /// Parses and validates a type reference.
    pub fn new(input: &str) -> Result<Self> {
        Self::from_expr(TypeExpr::parse(input)?)
    }

    /// Wraps an already parsed expression, validating its leaf.
    pub fn from_expr(expr: TypeExpr) -> Result<Self> {
        let leaf = expr.named_type();
        if !is_valid_name(leaf) {
            return Err(SchemaError::parse(
                expr.to_string(),
                format!("named type '{leaf}' is not a valid GraphQL name"),
            ));
        }
        Ok(Self(expr))
    }

    pub fn expr(&self) -> &TypeExpr {
        &self.0
    }

    pub fn named_type(&self) -> &str {
        self.0.named_type()
    }

    pub fn is_required(&self) -> bool {
        self.0.is_required()
    }

    pub fn is_list(&self) -> bool {
        self.0.is_list()
    }

    /// Deterministic constructor-code form of the reference,
    /// e.g. `nonNull(listOf(String()))` or `listOf(type("Article"))`.
    pub fn encode(&self) -> String {
        fn encode_expr(expr: &TypeExpr) -> String {
            match expr {
                TypeExpr::Named(name) if is_builtin_scalar(name) => format!("{name}()"),
                TypeExpr::Named(name) => format!("type(\"{name}\")"),
                TypeExpr::List(inner) => format!("listOf({})", encode_expr(inner)),
                TypeExpr::NonNull(inner) => format!("nonNull({})", encode_expr(inner)),
            }
        }
        encode_expr(&self.0)
    }
}

impl fmt::Display for EncodedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for EncodedType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<EncodedType> for String {
    fn from(value: EncodedType) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrappers() {
        let expr = TypeExpr::parse("[Article!]!").unwrap();
        assert_eq!(
            expr,
            TypeExpr::NonNull(Box::new(TypeExpr::List(Box::new(TypeExpr::NonNull(
                Box::new(TypeExpr::Named("Article".into()))
            )))))
        );
        assert_eq!(expr.to_string(), "[Article!]!");
        assert_eq!(expr.named_type(), "Article");
        assert!(expr.is_required());
        assert!(expr.is_list());
    }

    #[test]
    fn test_parse_class_leaf() {
        let expr = TypeExpr::parse(" [App\\Model\\Article] ").unwrap();
        assert_eq!(expr.named_type(), "App\\Model\\Article");
        let substituted = expr.with_named_type("Article");
        assert_eq!(substituted.to_string(), "[Article]");
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("[String").is_err());
        assert!(TypeExpr::parse("String!!").is_err());
        assert!(TypeExpr::parse("[A, B]").is_err());
        assert!(TypeExpr::parse("Foo Bar").is_err());
    }

    #[test]
    fn test_encoded_type_requires_graphql_leaf() {
        assert!(EncodedType::new("[String]!").is_ok());
        let err = EncodedType::new("[App.Model.Article]").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn test_encode_constructor_code() {
        let ty = EncodedType::new("[String]!").unwrap();
        assert_eq!(ty.encode(), "nonNull(listOf(String()))");

        let ty = EncodedType::new("Article").unwrap();
        assert_eq!(ty.encode(), "type(\"Article\")");
    }

    #[test]
    fn test_serde_uses_sdl_form() {
        let ty = EncodedType::new("[ID!]!").unwrap();
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"[ID!]!\"");
        let back: EncodedType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }
}
