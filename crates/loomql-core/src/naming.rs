//! Name handling for schema components.
//!
//! GraphQL names must match `[_A-Za-z][_0-9A-Za-z]*`. This module also carries
//! the pluraliser used to derive operation names such as `readArticles`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Checks if a name is valid for GraphQL.
///
/// - Must start with an underscore or letter (not a number)
/// - Can only contain underscores, letters, and numbers
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Fails with a naming error if `name` doesn't match the identifier grammar.
pub fn assert_valid_name(name: &str, context: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(SchemaError::naming(format!(
            "{context} name '{name}' must match [_A-Za-z][_0-9A-Za-z]*"
        )))
    }
}

/// Capitalizes the first character of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lowercases the first character of a string.
pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Returns the last segment of a namespaced class identifier.
///
/// Accepts `.`, `::` and `\` as separators: `App\Model\Article`,
/// `app::model::Article` and `App.Model.Article` all yield `Article`.
pub fn short_class_name(class: &str) -> &str {
    class
        .rsplit(['.', '\\', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(class)
}

/// Pluralisation strategy for generated operation names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Pluraliser {
    /// English heuristic with optional irregular overrides.
    English {
        #[serde(default)]
        irregular: IndexMap<String, String>,
    },
    /// Names are used as-is.
    None,
}

impl Default for Pluraliser {
    fn default() -> Self {
        Self::English {
            irregular: IndexMap::new(),
        }
    }
}

impl Pluraliser {
    /// Builds a pluraliser from the `config.pluraliser` value.
    ///
    /// Accepts `"english"`, `"none"` or `{ irregular = { Person = "People" } }`.
    pub fn from_config(value: &Value) -> Result<Self> {
        match value {
            Value::String(kind) => match kind.as_str() {
                "english" | "default" => Ok(Self::default()),
                "none" => Ok(Self::None),
                other => Err(SchemaError::config(format!(
                    "Unknown pluraliser '{other}'. Valid values: english, none"
                ))),
            },
            Value::Object(map) => {
                if let Some(key) = map.keys().find(|k| k.as_str() != "irregular") {
                    return Err(SchemaError::config(format!(
                        "invalid keys in config for pluraliser: {key}"
                    )));
                }
                let mut irregular = IndexMap::new();
                if let Some(entries) = map.get("irregular") {
                    let entries = entries.as_object().ok_or_else(|| {
                        SchemaError::config("pluraliser.irregular must be a map")
                    })?;
                    for (singular, plural) in entries {
                        let plural = plural.as_str().ok_or_else(|| {
                            SchemaError::config(format!(
                                "pluraliser.irregular.{singular} must be a string"
                            ))
                        })?;
                        irregular.insert(singular.clone(), plural.to_string());
                    }
                }
                Ok(Self::English { irregular })
            }
            _ => Err(SchemaError::config(
                "pluraliser must be a string or a map",
            )),
        }
    }

    /// Pluralises `name`.
    pub fn pluralise(&self, name: &str) -> String {
        match self {
            Self::None => name.to_string(),
            Self::English { irregular } => {
                if let Some(plural) = irregular.get(name) {
                    return plural.clone();
                }
                english_plural(name)
            }
        }
    }
}

fn english_plural(name: &str) -> String {
    let mut chars = name.chars().rev();
    if let (Some('y'), Some(before)) = (chars.next(), chars.next())
        && before.is_ascii_alphabetic()
        && !matches!(before.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
    {
        return format!("{}ies", &name[..name.len() - 1]);
    }
    format!("{name}s")
}
