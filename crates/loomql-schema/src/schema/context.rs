use indexmap::IndexMap;
use loomql_core::{Pluraliser, Result, SchemaError};
use serde::{Deserialize, Serialize};

use crate::resolver::ResolverRef;

fn default_resolver() -> Option<ResolverRef> {
    Some(ResolverRef::new("DefaultResolver", "resolve"))
}

/// Where a field's value comes from on the underlying model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Type the field points at, for relation fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
    /// Property name on the model class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

/// Per-schema state shared by assembly, plugins and resolvers.
///
/// Written during assembly and persisted with the artifact; resolvers only
/// read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaContext {
    #[serde(default = "default_resolver")]
    default_resolver: Option<ResolverRef>,
    #[serde(default)]
    pluraliser: Pluraliser,
    /// Model class to GraphQL type name
    #[serde(default)]
    class_types: IndexMap<String, String>,
    /// Type name to field name to mapping
    #[serde(default)]
    field_map: IndexMap<String, IndexMap<String, FieldMapping>>,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self {
            default_resolver: default_resolver(),
            pluraliser: Pluraliser::default(),
            class_types: IndexMap::new(),
            field_map: IndexMap::new(),
        }
    }
}

impl SchemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_resolver(&self) -> Option<&ResolverRef> {
        self.default_resolver.as_ref()
    }

    pub fn set_default_resolver(&mut self, resolver: Option<ResolverRef>) {
        self.default_resolver = resolver;
    }

    pub fn pluraliser(&self) -> &Pluraliser {
        &self.pluraliser
    }

    pub fn set_pluraliser(&mut self, pluraliser: Pluraliser) {
        self.pluraliser = pluraliser;
    }

    pub fn pluralise(&self, name: &str) -> String {
        self.pluraliser.pluralise(name)
    }

    pub fn add_class_type(&mut self, class: impl Into<String>, type_name: impl Into<String>) {
        self.class_types.insert(class.into(), type_name.into());
    }

    pub fn type_for_class(&self, class: &str) -> Option<&str> {
        self.class_types.get(class).map(String::as_str)
    }

    pub fn class_types(&self) -> &IndexMap<String, String> {
        &self.class_types
    }

    pub fn add_field_mapping(&mut self, type_name: &str, field: &str, mapping: FieldMapping) {
        self.field_map
            .entry(type_name.to_string())
            .or_default()
            .insert(field.to_string(), mapping);
    }

    pub fn field_mapping(&self, type_name: &str, field: &str) -> Option<&FieldMapping> {
        self.field_map.get(type_name)?.get(field)
    }

    /// Property backing `type_name.field`, falling back to the field name.
    pub fn property_for<'a>(&'a self, type_name: &str, field: &'a str) -> &'a str {
        self.field_mapping(type_name, field)
            .and_then(|m| m.property.as_deref())
            .unwrap_or(field)
    }

    /// Translates a dotted field path starting at `type_name` into the
    /// property path on the underlying models: `author.name` on `Article`
    /// becomes `["Author", "Name"]`.
    pub fn map_path(&self, type_name: &str, path: &str) -> Result<Vec<String>> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = type_name.to_string();
        let mut properties = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            let mapping = self.field_mapping(&current, segment).ok_or_else(|| {
                SchemaError::reference(format!("Field '{segment}' does not exist on {current}"))
            })?;
            properties.push(mapping.property.clone().unwrap_or_else(|| segment.to_string()));

            if index + 1 < segments.len() {
                current = mapping.related_type.clone().ok_or_else(|| {
                    SchemaError::reference(format!(
                        "Cannot traverse '{path}': {current}.{segment} is not a relation"
                    ))
                })?;
            }
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SchemaContext {
        let mut context = SchemaContext::new();
        context.add_field_mapping(
            "Article",
            "author",
            FieldMapping {
                related_type: Some("Author".into()),
                property: Some("Author".into()),
            },
        );
        context.add_field_mapping(
            "Article",
            "title",
            FieldMapping {
                related_type: None,
                property: Some("Title".into()),
            },
        );
        context.add_field_mapping(
            "Author",
            "name",
            FieldMapping {
                related_type: None,
                property: Some("Name".into()),
            },
        );
        context
    }

    #[test]
    fn test_map_path() {
        let context = context();
        assert_eq!(context.map_path("Article", "author.name").unwrap(), vec!["Author", "Name"]);
        assert_eq!(context.map_path("Article", "title").unwrap(), vec!["Title"]);
    }

    #[test]
    fn test_map_path_errors() {
        let context = context();
        let err = context.map_path("Article", "title.length").unwrap_err();
        assert!(err.to_string().contains("is not a relation"));
        let err = context.map_path("Article", "rating").unwrap_err();
        assert!(err.to_string().contains("'rating' does not exist on Article"));
    }

    #[test]
    fn test_property_fallback() {
        let context = context();
        assert_eq!(context.property_for("Article", "title"), "Title");
        assert_eq!(context.property_for("Comment", "body"), "body");
        assert_eq!(context.default_resolver().unwrap().to_string(), "DefaultResolver::resolve");
    }
}
