use loomql_config::keys::{assert_valid_keys, config_map};
use loomql_core::{Result, SchemaError};
use serde_json::{Value, json};

use super::{Capability, PluginContext, PluginTarget, SchemaPlugin, config_int, target_field};
use crate::resolver::ResolverRef;
use crate::schema::Schema;
use crate::types::{Argument, Field, NamedType, ObjectType};

pub const PAGE_INFO_TYPE: &str = "PageInfo";
pub const DEFAULT_LIMIT: u64 = 100;

const PAGINATE_KEYS: &[&str] = &["defaultLimit", "maxLimit"];

/// Wraps a list query in a connection type with `limit`/`offset` arguments.
pub struct PaginatePlugin;

impl SchemaPlugin for PaginatePlugin {
    fn identifier(&self) -> &str {
        "paginateList"
    }

    fn capabilities(&self) -> &[Capability] {
        &[Capability::ModelQuery, Capability::Query, Capability::SchemaUpdater]
    }

    fn update_schema(&self, schema: &mut Schema) -> Result<()> {
        let mut page_info = ObjectType::new(PAGE_INFO_TYPE)?;
        page_info.set_description("Position of the current page within the full list");
        page_info.add_field(Field::with_type("totalCount", "Int!")?);
        page_info.add_field(Field::with_type("hasNextPage", "Boolean!")?);
        page_info.add_field(Field::with_type("hasPreviousPage", "Boolean!")?);
        schema.add_type(page_info);
        Ok(())
    }

    fn apply(&self, target: &mut PluginTarget<'_>, context: &mut PluginContext, config: &Value) -> Result<()> {
        let field = target_field(target, self.identifier())?;
        let config = config_map(config, "paginateList")?;
        assert_valid_keys(config, PAGINATE_KEYS, "paginateList")?;
        let config = Value::Object(config.clone());
        let default_limit = config_int(&config, "defaultLimit", DEFAULT_LIMIT)?;
        let max_limit = config_int(&config, "maxLimit", default_limit.max(DEFAULT_LIMIT))?;

        let list_type = field
            .type_ref()
            .cloned()
            .ok_or_else(|| SchemaError::config(format!("field {} has no type", field.name())))?;
        if !list_type.is_list() {
            return Err(SchemaError::config(format!(
                "paginateList requires a list type, got {list_type}"
            )));
        }
        let node = list_type.named_type().to_string();
        let connection_name = format!("{}Connection", field.name());
        let edge_name = format!("{}Edge", field.name());

        let mut edge = ObjectType::new(&edge_name)?;
        edge.add_field(Field::with_type("node", &format!("{node}!"))?);

        let mut connection = ObjectType::new(&connection_name)?;
        connection.add_field(Field::with_type("nodes", &list_type.to_string())?);
        connection.add_field(Field::with_type("edges", &format!("[{edge_name}!]!"))?);
        connection.add_field(Field::with_type("pageInfo", &format!("{PAGE_INFO_TYPE}!"))?);

        context.add_type(NamedType::Object(edge));
        context.add_type(NamedType::Object(connection));

        field.set_type(&format!("{connection_name}!"), false)?;

        let mut limit = Argument::new("limit", "Int")?;
        limit.set_default_value(json!(default_limit))?;
        let mut offset = Argument::new("offset", "Int")?;
        offset.set_default_value(json!(0))?;
        field.add_arg(limit);
        field.add_arg(offset);

        field.add_resolver_context("defaultLimit", json!(default_limit));
        field.add_resolver_context("maxLimit", json!(max_limit));
        field.add_afterware(ResolverRef::new("Paginator", "paginate"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(field: &mut Field, config: Value) -> Result<Vec<NamedType>> {
        let mut context = PluginContext::default();
        PaginatePlugin.apply(&mut PluginTarget::Query(field), &mut context, &config)?;
        Ok(context.take_added())
    }

    #[test]
    fn test_connection_shape() {
        let mut field = Field::with_type("readArticles", "[Article!]!").unwrap();
        let added = apply(&mut field, json!({})).unwrap();

        assert_eq!(field.type_ref().unwrap().to_string(), "readArticlesConnection!");
        assert_eq!(field.argument("limit").unwrap().default_value(), Some(&json!(100)));
        assert_eq!(field.argument("offset").unwrap().default_value(), Some(&json!(0)));
        assert_eq!(field.afterware()[0].to_string(), "Paginator::paginate");

        let names: Vec<_> = added.iter().map(NamedType::name).collect();
        assert_eq!(names, vec!["readArticlesEdge", "readArticlesConnection"]);
        let NamedType::Object(connection) = &added[1] else {
            panic!("connection must be an object type");
        };
        assert_eq!(connection.field("nodes").unwrap().type_ref().unwrap().to_string(), "[Article!]!");
        assert_eq!(connection.field("pageInfo").unwrap().type_ref().unwrap().to_string(), "PageInfo!");
    }

    #[test]
    fn test_limits_from_config() {
        let mut field = Field::with_type("readArticles", "[Article]").unwrap();
        apply(&mut field, json!({"defaultLimit": 10, "maxLimit": 50})).unwrap();
        assert_eq!(field.resolver_context()["defaultLimit"], json!(10));
        assert_eq!(field.resolver_context()["maxLimit"], json!(50));
    }

    #[test]
    fn test_rejects_non_list() {
        let mut field = Field::with_type("readOneArticle", "Article").unwrap();
        let err = apply(&mut field, json!({})).unwrap_err();
        assert!(err.to_string().contains("requires a list type"));

        let mut field = Field::with_type("readArticles", "[Article]").unwrap();
        assert!(apply(&mut field, json!({"pageSize": 3})).is_err());
    }
}
