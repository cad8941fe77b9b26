//! Resolver classes referenced by assembly defaults and built-in plugins.

use std::cmp::Ordering;

use serde_json::{Value, json};

use super::error::ResolveError;
use super::resolvers::{ResolveRequest, ResolverClass};
use crate::plugins::DEFAULT_LIMIT;

pub(crate) fn classes() -> Vec<ResolverClass> {
    vec![
        ResolverClass::new("DefaultResolver").resolver("resolve", |req: ResolveRequest| async move {
            Ok(DefaultResolver::resolve(&req))
        }),
        ResolverClass::new("Paginator").afterware("paginate", Paginator::paginate),
        ResolverClass::new("Sorter").afterware("sort", Sorter::sort),
        ResolverClass::new("FirstResult").afterware("first", FirstResult::first),
        ResolverClass::new("Truncator").afterware("truncate", Truncator::truncate),
    ]
}

/// Reads the field's property from the parent object.
pub struct DefaultResolver;

impl DefaultResolver {
    pub fn resolve(request: &ResolveRequest) -> Value {
        request
            .parent_property(&request.field_name)
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn int_arg(request: &ResolveRequest, name: &str) -> Result<Option<u64>, ResolveError> {
    match request.arg(name) {
        None => Ok(None),
        Some(value) => match value.as_i64() {
            Some(n) if n >= 0 => Ok(Some(n as u64)),
            _ => Err(ResolveError::invalid_argument(name, format!("expected a non-negative integer, got {value}"))),
        },
    }
}

fn list_items(value: Value, request: &ResolveRequest) -> Result<Vec<Value>, ResolveError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(ResolveError::invalid_value(
            format!("{}.{}", request.type_name, request.field_name),
            format!("expected a list, got {other}"),
        )),
    }
}

/// Slices a list into a connection object.
pub struct Paginator;

impl Paginator {
    pub fn paginate(value: Value, request: &ResolveRequest) -> Result<Value, ResolveError> {
        let items = list_items(value, request)?;
        let context_int = |key: &str| request.context_value(key).and_then(Value::as_u64);

        let default_limit = context_int("defaultLimit").unwrap_or(DEFAULT_LIMIT);
        let max_limit = context_int("maxLimit").unwrap_or(default_limit);
        let limit = int_arg(request, "limit")?.unwrap_or(default_limit).min(max_limit) as usize;
        let offset = int_arg(request, "offset")?.unwrap_or(0) as usize;

        let total = items.len();
        let nodes: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
        let edges: Vec<Value> = nodes.iter().map(|node| json!({ "node": node })).collect();

        Ok(json!({
            "nodes": nodes,
            "edges": edges,
            "pageInfo": {
                "totalCount": total,
                "hasNextPage": offset.saturating_add(limit) < total,
                "hasPreviousPage": offset > 0,
            },
        }))
    }
}

/// Orders a list by the fields named in the `sort` argument.
pub struct Sorter;

impl Sorter {
    pub fn sort(value: Value, request: &ResolveRequest) -> Result<Value, ResolveError> {
        let Some(sort) = request.arg("sort") else {
            return Ok(value);
        };
        let sort = sort
            .as_object()
            .ok_or_else(|| ResolveError::invalid_argument("sort", "expected an input object"))?;
        let node_type = request
            .context_value("nodeType")
            .and_then(Value::as_str)
            .unwrap_or(&request.type_name);

        let mut keys = Vec::with_capacity(sort.len());
        for (field, direction) in sort {
            let descending = match direction.as_str() {
                Some("ASC") => false,
                Some("DESC") => true,
                None if direction.is_null() => continue,
                _ => {
                    return Err(ResolveError::invalid_argument(
                        "sort",
                        format!("{field} must be ASC or DESC, got {direction}"),
                    ));
                }
            };
            let property = request.schema.property_for(node_type, field).to_string();
            keys.push((property, descending));
        }

        let mut items = list_items(value, request)?;
        items.sort_by(|a, b| {
            keys.iter()
                .map(|(property, descending)| {
                    let ordering = compare_values(&a[property.as_str()], &b[property.as_str()]);
                    if *descending { ordering.reverse() } else { ordering }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(Value::Array(items))
    }
}

/// Total order over JSON scalars: null, booleans, numbers, strings, then
/// everything else as equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) | Value::Object(_) => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub struct FirstResult;

impl FirstResult {
    pub fn first(value: Value, _request: &ResolveRequest) -> Result<Value, ResolveError> {
        Ok(match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        })
    }
}

/// Cuts a string result to `length` characters.
pub struct Truncator;

impl Truncator {
    pub fn truncate(value: Value, request: &ResolveRequest) -> Result<Value, ResolveError> {
        let Some(length) = int_arg(request, "length")? else {
            return Ok(value);
        };
        Ok(match value {
            Value::String(s) if s.chars().count() > length as usize => {
                Value::String(s.chars().take(length as usize).collect())
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldMapping, SchemaContext};
    use loomql_config::ConfigMap;
    use std::sync::Arc;

    fn request(args: Value, context: Value) -> ResolveRequest {
        let mut schema = SchemaContext::new();
        schema.add_field_mapping(
            "Article",
            "title",
            FieldMapping {
                related_type: None,
                property: Some("Title".into()),
            },
        );
        ResolveRequest {
            type_name: "Query".into(),
            field_name: "readArticles".into(),
            parent: Value::Null,
            args: args.as_object().cloned().unwrap_or_default(),
            context: context.as_object().cloned().unwrap_or_else(ConfigMap::new),
            schema: Arc::new(schema),
        }
    }

    fn articles() -> Value {
        json!([{"Title": "b"}, {"Title": "c"}, {"Title": "a"}])
    }

    #[test]
    fn test_default_resolver_uses_property_map() {
        let mut req = request(json!({}), json!({}));
        req.type_name = "Article".into();
        req.field_name = "title".into();
        req.parent = json!({"Title": "Loom"});
        assert_eq!(DefaultResolver::resolve(&req), json!("Loom"));

        req.parent = Value::Null;
        assert_eq!(DefaultResolver::resolve(&req), Value::Null);
    }

    #[test]
    fn test_paginate() {
        let req = request(json!({"limit": 2, "offset": 1}), json!({"defaultLimit": 10, "maxLimit": 50}));
        let page = Paginator::paginate(articles(), &req).unwrap();
        assert_eq!(page["nodes"], json!([{"Title": "c"}, {"Title": "a"}]));
        assert_eq!(page["edges"][0]["node"], json!({"Title": "c"}));
        assert_eq!(
            page["pageInfo"],
            json!({"totalCount": 3, "hasNextPage": false, "hasPreviousPage": true})
        );
    }

    #[test]
    fn test_paginate_clamps_to_max_limit() {
        let req = request(json!({"limit": 500}), json!({"defaultLimit": 1, "maxLimit": 2}));
        let page = Paginator::paginate(articles(), &req).unwrap();
        assert_eq!(page["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(page["pageInfo"]["hasNextPage"], json!(true));

        let req = request(json!({"limit": -1}), json!({}));
        assert!(matches!(
            Paginator::paginate(articles(), &req),
            Err(ResolveError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_sort_maps_fields_to_properties() {
        let req = request(json!({"sort": {"title": "DESC"}}), json!({"nodeType": "Article"}));
        let sorted = Sorter::sort(articles(), &req).unwrap();
        assert_eq!(sorted, json!([{"Title": "c"}, {"Title": "b"}, {"Title": "a"}]));

        let unsorted = Sorter::sort(articles(), &request(json!({}), json!({}))).unwrap();
        assert_eq!(unsorted, articles());
    }

    #[test]
    fn test_first_and_truncate() {
        let req = request(json!({"length": 3}), json!({}));
        assert_eq!(FirstResult::first(articles(), &req).unwrap(), json!({"Title": "b"}));
        assert_eq!(FirstResult::first(json!([]), &req).unwrap(), Value::Null);
        assert_eq!(Truncator::truncate(json!("weaving"), &req).unwrap(), json!("wea"));
        assert_eq!(Truncator::truncate(json!("ab"), &req).unwrap(), json!("ab"));
    }
}
