use loomql_config::keys::{assert_valid_keys, config_map, string_list};
use loomql_core::{Result, SchemaError, is_builtin_scalar};
use serde_json::{Value, json};

use super::{Capability, PluginContext, PluginTarget, SchemaPlugin, target_field};
use crate::resolver::ResolverRef;
use crate::schema::Schema;
use crate::types::{Argument, EnumType, Field, NamedType, ObjectType};

pub const SORT_DIRECTION_ENUM: &str = "SortDirection";

const SORT_KEYS: &[&str] = &["fields"];

/// Adds a `sort` argument over the scalar fields of the listed type.
pub struct SortPlugin;

impl SchemaPlugin for SortPlugin {
    fn identifier(&self) -> &str {
        "sort"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::ModelQuery, Capability::Query, Capability::SchemaUpdater]
    }

    /// Sorting has to see the full list before pagination slices it.
    fn priority(&self) -> i32 {
        10
    }

    fn update_schema(&self, schema: &mut Schema) -> Result<()> {
        schema.add_enum(EnumType::with_values(SORT_DIRECTION_ENUM, ["ASC", "DESC"])?);
        Ok(())
    }

    fn apply(&self, target: &mut PluginTarget<'_>, context: &mut PluginContext, config: &Value) -> Result<()> {
        let field = target_field(target, self.identifier())?;
        let config = config_map(config, "sort")?;
        assert_valid_keys(config, SORT_KEYS, "sort")?;

        let node = match (field.operation_model(), field.type_ref()) {
            (Some(model), _) => model.to_string(),
            (None, Some(type_ref)) => type_ref.named_type().to_string(),
            (None, None) => {
                return Err(SchemaError::config(format!("field {} has no type", field.name())));
            }
        };
        let node_fields = context
            .fields_of(&node)
            .ok_or_else(|| SchemaError::reference(format!("Cannot sort by fields of unknown type '{node}'")))?;

        let sortable: Vec<String> = match config.get("fields") {
            Some(listed) => {
                let listed = string_list(listed, "sort.fields")?;
                if let Some(missing) = listed.iter().find(|name| !node_fields.iter().any(|(f, _)| f == *name)) {
                    return Err(SchemaError::config(format!(
                        "sort field '{missing}' does not exist on {node}"
                    )));
                }
                listed
            }
            None => node_fields
                .iter()
                .filter(|(_, type_ref)| is_builtin_scalar(type_ref.named_type()) && !type_ref.is_list())
                .map(|(name, _)| name.clone())
                .collect(),
        };
        if sortable.is_empty() {
            return Err(SchemaError::config(format!("{node} has no sortable fields")));
        }

        let input_name = format!("{node}SortFields");
        let mut input = ObjectType::input(&input_name)?;
        for name in &sortable {
            input.add_field(Field::with_type(name, SORT_DIRECTION_ENUM)?);
        }
        context.add_type(NamedType::Object(input));

        field.add_arg(Argument::new("sort", &input_name)?);
        field.add_resolver_context("nodeType", json!(node));
        field.add_afterware(ResolverRef::new("Sorter", "sort"));
        Ok(())
    }
}
