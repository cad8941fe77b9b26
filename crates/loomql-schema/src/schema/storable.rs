use std::collections::HashMap;

use loomql_core::{Result, SchemaError, TypeExpr, is_builtin_scalar};
use tracing::debug;

use super::context::SchemaContext;
use super::{MUTATION_TYPE, QUERY_TYPE};
use crate::types::{Field, NamedType, ObjectType};

/// A finalized schema: every named type in emission order plus the schema
/// context. Immutable; produced by [`Schema::process`](super::Schema::process).
#[derive(Debug, Clone)]
pub struct StorableSchema {
    key: String,
    types: Vec<NamedType>,
    context: SchemaContext,
}

impl StorableSchema {
    pub fn new(key: impl Into<String>, types: Vec<NamedType>, context: SchemaContext) -> Self {
        Self {
            key: key.into(),
            types,
            context,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn types(&self) -> &[NamedType] {
        &self.types
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.iter().find(|ty| ty.name() == name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn query(&self) -> Option<&ObjectType> {
        self.object(QUERY_TYPE)
    }

    pub fn mutation(&self) -> Option<&ObjectType> {
        self.object(MUTATION_TYPE)
    }

    fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.get(name)? {
            NamedType::Object(ty) => Some(ty),
            _ => None,
        }
    }

    /// Checks the global invariants. Any failure aborts the build.
    pub fn validate(&self) -> Result<()> {
        self.validate_unique_names()?;

        match self.query() {
            None => {
                return Err(SchemaError::validation(format!(
                    "Schema '{}' has no {QUERY_TYPE} type",
                    self.key
                )));
            }
            Some(query) if query.fields().is_empty() => {
                return Err(SchemaError::validation(format!(
                    "{QUERY_TYPE} type in schema '{}' must declare at least one field",
                    self.key
                )));
            }
            Some(_) => {}
        }

        let by_name: HashMap<&str, &NamedType> = self.types.iter().map(|ty| (ty.name(), ty)).collect();
        for ty in &self.types {
            ty.validate()?;
            match ty {
                NamedType::Object(object) => {
                    for interface in object.interfaces() {
                        if !matches!(by_name.get(interface.as_str()), Some(NamedType::Interface(_))) {
                            return Err(SchemaError::validation(format!(
                                "Type '{}' implements unknown interface '{interface}'",
                                object.name()
                            )));
                        }
                    }
                    for field in object.fields().values() {
                        let position = if object.is_input() { Position::Input } else { Position::Output };
                        check_field(&by_name, object.name(), field, position)?;
                    }
                }
                NamedType::Interface(interface) => {
                    for field in interface.fields().values() {
                        check_field(&by_name, interface.name(), field, Position::Output)?;
                    }
                }
                NamedType::Union(union) => {
                    for member in union.types() {
                        if !matches!(by_name.get(member.as_str()), Some(NamedType::Object(o)) if !o.is_input()) {
                            return Err(SchemaError::validation(format!(
                                "Union '{}' member '{member}' must be an object type",
                                union.name()
                            )));
                        }
                    }
                }
                NamedType::Enum(_) | NamedType::Scalar(_) => {}
            }
        }

        debug!(schema = %self.key, types = self.types.len(), "Schema validated");
        Ok(())
    }

    fn validate_unique_names(&self) -> Result<()> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for ty in &self.types {
            *seen.entry(ty.name()).or_default() += 1;
        }
        let mut duplicates: Vec<&str> = Vec::new();
        for ty in &self.types {
            if seen[ty.name()] > 1 && !duplicates.contains(&ty.name()) {
                duplicates.push(ty.name());
            }
        }

        if duplicates.is_empty() {
            return Ok(());
        }
        Err(SchemaError::validation(format!(
            "Type names must be unique across types, interfaces, unions, enums and scalars. Duplicates: {}",
            duplicates.join(", ")
        )))
    }
}

#[derive(Clone, Copy)]
enum Position {
    Input,
    Output,
}

fn check_field(types: &HashMap<&str, &NamedType>, owner: &str, field: &Field, position: Position) -> Result<()> {
    let context = format!("{owner}.{}", field.name());
    let encoded = field.encoded_type()?;
    check_reference(types, &context, encoded.expr(), position)?;
    for argument in field.args().values() {
        check_reference(
            types,
            &format!("{context}({})", argument.name()),
            argument.type_ref(),
            Position::Input,
        )?;
    }
    Ok(())
}

fn check_reference(
    types: &HashMap<&str, &NamedType>,
    context: &str,
    expr: &TypeExpr,
    position: Position,
) -> Result<()> {
    let leaf = expr.named_type();
    if is_builtin_scalar(leaf) {
        return Ok(());
    }
    let ty = types
        .get(leaf)
        .ok_or_else(|| SchemaError::validation(format!("{context} references unknown type '{leaf}'")))?;

    let compatible = match position {
        Position::Input => ty.is_input_compatible(),
        Position::Output => ty.is_output_compatible(),
    };
    if !compatible {
        let expected = match position {
            Position::Input => "an input",
            Position::Output => "an output",
        };
        return Err(SchemaError::validation(format!(
            "{context} uses {} '{leaf}' where {expected} type is required",
            ty.kind()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EnumType, ScalarType};

    fn query(fields: &[(&str, &str)]) -> ObjectType {
        let mut query = ObjectType::root(QUERY_TYPE);
        for (name, ty) in fields {
            query.add_field(Field::with_type(name, ty).unwrap());
        }
        query
    }

    #[test]
    fn test_valid_schema() {
        let schema = StorableSchema::new(
            "default",
            vec![
                NamedType::Object(query(&[("status", "Status")])),
                NamedType::Enum(EnumType::with_values("Status", ["OK"]).unwrap()),
            ],
            SchemaContext::new(),
        );
        assert!(schema.validate().is_ok());
        assert!(schema.exists("Status"));
    }

    #[test]
    fn test_duplicate_names_listed() {
        let schema = StorableSchema::new(
            "default",
            vec![
                NamedType::Object(query(&[("foo", "Foo")])),
                NamedType::Object(ObjectType::from_config("Foo", &serde_json::json!({"fields": {"x": "Int"}})).unwrap()),
                NamedType::Scalar(ScalarType::new("Foo").unwrap()),
            ],
            SchemaContext::new(),
        );
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicates: Foo"));
    }

    #[test]
    fn test_query_required() {
        let schema = StorableSchema::new("default", vec![], SchemaContext::new());
        assert!(schema.validate().unwrap_err().to_string().contains("has no Query type"));

        let schema = StorableSchema::new("default", vec![NamedType::Object(query(&[]))], SchemaContext::new());
        assert!(matches!(schema.validate(), Err(SchemaError::Validation(_))));
    }

    #[test]
    fn test_empty_enum_fails() {
        let schema = StorableSchema::new(
            "default",
            vec![
                NamedType::Object(query(&[("status", "Status")])),
                NamedType::Enum(EnumType::new("Status").unwrap()),
            ],
            SchemaContext::new(),
        );
        assert!(schema.validate().unwrap_err().to_string().contains("at least one value"));
    }

    #[test]
    fn test_unknown_and_incompatible_references() {
        let schema = StorableSchema::new(
            "default",
            vec![NamedType::Object(query(&[("article", "Article")]))],
            SchemaContext::new(),
        );
        assert!(schema.validate().unwrap_err().to_string().contains("unknown type 'Article'"));

        let mut input = ObjectType::input("ArticleInput").unwrap();
        input.add_field(Field::with_type("title", "String").unwrap());
        let schema = StorableSchema::new(
            "default",
            vec![
                NamedType::Object(query(&[("article", "ArticleInput")])),
                NamedType::Object(input),
            ],
            SchemaContext::new(),
        );
        assert!(schema.validate().unwrap_err().to_string().contains("where an output type is required"));
    }
}
