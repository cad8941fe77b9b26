use loomql_config::keys::{assert_valid_keys, config_map};
use loomql_core::{Result, SchemaError};
use serde_json::{Value, json};

use super::{Capability, PluginContext, PluginTarget, SchemaPlugin, config_int, target_field};
use crate::resolver::ResolverRef;
use crate::types::Argument;

const TRUNCATE_KEYS: &[&str] = &["defaultLength"];

/// Adds a `length` argument that cuts string results to that many
/// characters.
pub struct TruncatePlugin;

impl SchemaPlugin for TruncatePlugin {
    fn identifier(&self) -> &str {
        "truncate"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::Field, Capability::ModelField]
    }

    fn apply(&self, target: &mut PluginTarget<'_>, _context: &mut PluginContext, config: &Value) -> Result<()> {
        let field = target_field(target, self.identifier())?;
        let map = config_map(config, "truncate")?;
        assert_valid_keys(map, TRUNCATE_KEYS, "truncate")?;

        match field.type_ref() {
            Some(type_ref) if type_ref.named_type() == "String" && !type_ref.is_list() => {}
            other => {
                return Err(SchemaError::config(format!(
                    "truncate only applies to String fields, {} is {}",
                    field.name(),
                    other.map(ToString::to_string).unwrap_or_else(|| "untyped".into())
                )));
            }
        }

        let mut length = Argument::new("length", "Int")?;
        if map.contains_key("defaultLength") {
            length.set_default_value(json!(config_int(config, "defaultLength", 0)?))?;
        }
        field.add_arg(length);
        field.add_afterware(ResolverRef::new("Truncator", "truncate"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    #[test]
    fn test_truncate_string_field() {
        let mut field = Field::with_type("title", "String!").unwrap();
        let mut context = PluginContext::default();
        TruncatePlugin
            .apply(
                &mut PluginTarget::ModelField {
                    model: "Article",
                    field: &mut field,
                },
                &mut context,
                &json!({"defaultLength": 20}),
            )
            .unwrap();
        let length = field.argument("length").unwrap();
        assert_eq!(length.type_ref().to_string(), "Int");
        assert_eq!(length.default_value(), Some(&json!(20)));
        assert_eq!(field.afterware()[0].to_string(), "Truncator::truncate");
    }

    #[test]
    fn test_rejects_non_string() {
        let mut field = Field::with_type("views", "Int").unwrap();
        let mut context = PluginContext::default();
        let err = TruncatePlugin
            .apply(
                &mut PluginTarget::Field {
                    owner: "Article",
                    field: &mut field,
                },
                &mut context,
                &json!({}),
            )
            .unwrap_err();
        assert!(err.to_string().contains("only applies to String fields"));
    }
}
