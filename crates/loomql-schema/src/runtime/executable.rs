//! Bridges a persisted artifact to an executable `async-graphql` schema.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Interface,
    InterfaceField, Object, ResolverContext, Scalar, Schema, TypeRef, Union,
};
use async_graphql::{Name, Value as GqlValue};
use loomql_config::ConfigMap;
use loomql_core::{Result, SchemaError, TypeExpr, is_builtin_scalar};
use serde_json::Value;
use tracing::{debug, info};

use super::error::ResolveError;
use super::registry::{RuntimeArgument, RuntimeField, RuntimeKind, RuntimeType, TypeRegistry};
use super::resolvers::{ResolveRequest, ResolverChain, ResolverRegistry};
use super::value::{graphql_to_json, json_to_graphql_value};
use crate::schema::{MUTATION_TYPE, QUERY_TYPE, SchemaContext};

type KindMap = Arc<HashMap<String, RuntimeKind>>;

fn type_ref(expr: &TypeExpr) -> TypeRef {
    match expr {
        TypeExpr::Named(name) => TypeRef::Named(name.clone().into()),
        TypeExpr::List(inner) => TypeRef::List(Box::new(type_ref(inner))),
        TypeExpr::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
    }
}

fn input_value(arg: &RuntimeArgument) -> InputValue {
    let mut input = InputValue::new(&arg.name, type_ref(&arg.type_ref));
    if let Some(description) = &arg.description {
        input = input.description(description);
    }
    if let Some(default) = &arg.default_value {
        input = input.default_value(json_to_graphql_value(default.clone()));
    }
    input
}

/// Converts a resolver result into the shape `async-graphql` expects for
/// `expr`. Abstract types need a `__typename` on the value.
fn to_field_value<'v>(
    value: Value,
    expr: &TypeExpr,
    kinds: &HashMap<String, RuntimeKind>,
    field: &str,
) -> std::result::Result<Option<FieldValue<'v>>, ResolveError> {
    match expr {
        TypeExpr::NonNull(inner) => to_field_value(value, inner, kinds, field),
        _ if value.is_null() => Ok(None),
        TypeExpr::List(inner) => {
            let Value::Array(items) = value else {
                return Err(ResolveError::invalid_value(field, "expected a list"));
            };
            let items = items
                .into_iter()
                .map(|item| Ok(to_field_value(item, inner, kinds, field)?.unwrap_or(FieldValue::NULL)))
                .collect::<std::result::Result<Vec<_>, ResolveError>>()?;
            Ok(Some(FieldValue::list(items)))
        }
        TypeExpr::Named(name) => match kinds.get(name) {
            Some(RuntimeKind::Enum) => match value {
                Value::String(item) => Ok(Some(FieldValue::value(GqlValue::Enum(Name::new(item))))),
                other => Err(ResolveError::invalid_value(
                    field,
                    format!("expected a {name} member name, got {other}"),
                )),
            },
            Some(RuntimeKind::Interface | RuntimeKind::Union) => {
                let concrete = value
                    .get("__typename")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ResolveError::invalid_value(field, format!("{name} value has no __typename"))
                    })?;
                Ok(Some(FieldValue::value(json_to_graphql_value(value)).with_type(concrete)))
            }
            _ => Ok(Some(FieldValue::value(json_to_graphql_value(value)))),
        },
    }
}

struct FieldRuntime {
    type_name: String,
    field: RuntimeField,
    chain: ResolverChain,
    schema: Arc<SchemaContext>,
    kinds: KindMap,
}

impl FieldRuntime {
    fn request(&self, ctx: &ResolverContext<'_>) -> ResolveRequest {
        let parent = ctx
            .parent_value
            .as_value()
            .map(graphql_to_json)
            .unwrap_or(Value::Null);
        let args: ConfigMap = ctx
            .args
            .as_index_map()
            .iter()
            .map(|(name, value)| (name.to_string(), graphql_to_json(value)))
            .collect();

        ResolveRequest {
            type_name: self.type_name.clone(),
            field_name: self.field.name.clone(),
            parent,
            args,
            context: self.field.context.clone(),
            schema: Arc::clone(&self.schema),
        }
    }

    async fn resolve<'v>(&self, request: ResolveRequest) -> async_graphql::Result<Option<FieldValue<'v>>> {
        let value = self
            .chain
            .run(request)
            .await
            .map_err(ResolveError::into_graphql_error)?;

        let path = format!("{}.{}", self.type_name, self.field.name);
        to_field_value(value, &self.field.type_ref, &self.kinds, &path).map_err(ResolveError::into_graphql_error)
    }
}

impl TypeRegistry {
    /// Constructs every type of the artifact and wires each object field to
    /// its resolver chain.
    pub fn executable_schema(&self, resolvers: &ResolverRegistry) -> Result<Schema> {
        if !self.has_type(QUERY_TYPE) {
            return Err(SchemaError::validation(format!(
                "Schema '{}' has no {QUERY_TYPE} type",
                self.artifact().key()
            )));
        }

        let types = self
            .artifact()
            .type_names()
            .map(|name| self.get_type(name))
            .collect::<Result<Vec<_>>>()?;
        let kinds: KindMap = Arc::new(types.iter().map(|ty| (ty.name.clone(), ty.kind)).collect());

        let mutation = self.has_type(MUTATION_TYPE).then_some(MUTATION_TYPE);
        let mut builder = Schema::build(QUERY_TYPE, mutation, None);

        for ty in &types {
            builder = match ty.kind {
                RuntimeKind::Object => builder.register(self.object(ty, resolvers, &kinds)?),
                RuntimeKind::InputObject => builder.register(input_object(ty)),
                RuntimeKind::Interface => builder.register(interface(ty)),
                RuntimeKind::Union => builder.register(union(ty)),
                RuntimeKind::Enum => builder.register(enumeration(ty)),
                RuntimeKind::Scalar if is_builtin_scalar(&ty.name) => builder,
                RuntimeKind::Scalar => builder.register(scalar(ty)),
            };
        }

        let schema = builder
            .finish()
            .map_err(|e| SchemaError::validation(format!("Schema '{}': {e}", self.artifact().key())))?;
        info!(schema = %self.artifact().key(), types = types.len(), "Built executable schema");
        Ok(schema)
    }

    fn object(&self, ty: &RuntimeType, resolvers: &ResolverRegistry, kinds: &KindMap) -> Result<Object> {
        let mut object = Object::new(&ty.name);
        if let Some(description) = &ty.description {
            object = object.description(description);
        }
        for name in &ty.interfaces {
            object = object.implement(name);
        }

        let schema = Arc::clone(self.artifact().context());
        for field in ty.fields.values() {
            let resolver = field
                .resolver
                .as_ref()
                .or_else(|| schema.default_resolver())
                .ok_or_else(|| {
                    SchemaError::reference(format!("No resolver found for {}.{}", ty.name, field.name))
                })?;
            let chain = ResolverChain::build(resolvers, resolver, &field.middleware, &field.afterware)
                .map_err(|e| SchemaError::reference(format!("{}.{}: {e}", ty.name, field.name)))?;
            debug!(type_name = %ty.name, field = %field.name, resolver = %resolver, "Wiring field");

            let runtime = Arc::new(FieldRuntime {
                type_name: ty.name.clone(),
                field: field.clone(),
                chain,
                schema: Arc::clone(&schema),
                kinds: Arc::clone(kinds),
            });
            let mut output = Field::new(&field.name, type_ref(&field.type_ref), move |ctx| {
                let runtime = Arc::clone(&runtime);
                let request = runtime.request(&ctx);
                FieldFuture::new(async move { runtime.resolve(request).await })
            });
            if let Some(description) = &field.description {
                output = output.description(description);
            }
            for arg in &field.args {
                output = output.argument(input_value(arg));
            }
            object = object.field(output);
        }
        Ok(object)
    }
}

fn input_object(ty: &RuntimeType) -> InputObject {
    let mut input = InputObject::new(&ty.name);
    if let Some(description) = &ty.description {
        input = input.description(description);
    }
    for field in ty.fields.values() {
        let mut value = InputValue::new(&field.name, type_ref(&field.type_ref));
        if let Some(description) = &field.description {
            value = value.description(description);
        }
        input = input.field(value);
    }
    input
}

fn interface(ty: &RuntimeType) -> Interface {
    let mut interface = Interface::new(&ty.name);
    if let Some(description) = &ty.description {
        interface = interface.description(description);
    }
    for field in ty.fields.values() {
        let mut output = InterfaceField::new(&field.name, type_ref(&field.type_ref));
        for arg in &field.args {
            output = output.argument(input_value(arg));
        }
        interface = interface.field(output);
    }
    interface
}

fn union(ty: &RuntimeType) -> Union {
    let mut union = Union::new(&ty.name);
    if let Some(description) = &ty.description {
        union = union.description(description);
    }
    for member in &ty.possible_types {
        union = union.possible_type(member);
    }
    union
}

fn enumeration(ty: &RuntimeType) -> Enum {
    let mut enumeration = Enum::new(&ty.name);
    if let Some(description) = &ty.description {
        enumeration = enumeration.description(description);
    }
    for (name, description, deprecation) in &ty.values {
        let mut item = EnumItem::new(name);
        if let Some(description) = description {
            item = item.description(description);
        }
        if let Some(reason) = deprecation {
            item = item.deprecation(Some(reason.as_str()));
        }
        enumeration = enumeration.item(item);
    }
    enumeration
}

fn scalar(ty: &RuntimeType) -> Scalar {
    let scalar = Scalar::new(&ty.name);
    match &ty.description {
        Some(description) => scalar.description(description),
        None => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{EncoderRegistry, SchemaArtifact};
    use crate::resolver::ResolverRef;
    use crate::runtime::{ArtifactRegistry, ResolverClass};
    use crate::types::{EnumType, Field as SchemaField, NamedType, ObjectType};
    use serde_json::json;

    fn registry() -> TypeRegistry {
        let mut article = ObjectType::new("Article").unwrap();
        article.add_field(SchemaField::with_type("title", "String").unwrap());
        article.add_field(SchemaField::with_type("status", "Status").unwrap());

        let mut first = SchemaField::with_type("first", "Article").unwrap();
        first.set_resolver(ResolverRef::new("Articles", "all"));
        first.add_afterware(ResolverRef::new("FirstResult", "first"));
        let mut query = ObjectType::new("Query").unwrap();
        query.add_field(first);
        let mut all = SchemaField::with_type("all", "[Article!]!").unwrap();
        all.set_resolver(ResolverRef::new("Articles", "all"));
        query.add_field(all);

        let types = EncoderRegistry::new()
            .encode_all(&[
                NamedType::Object(query),
                NamedType::Object(article),
                NamedType::Enum(EnumType::with_values("Status", ["DRAFT", "LIVE"]).unwrap()),
            ])
            .unwrap();
        let artifact = SchemaArtifact {
            key: "default".into(),
            hash: "abc".into(),
            context: SchemaContext::new(),
            types,
        };
        TypeRegistry::new(Arc::new(ArtifactRegistry::new(artifact)))
    }

    fn resolvers() -> ResolverRegistry {
        let mut resolvers = ResolverRegistry::with_builtins();
        resolvers.register(ResolverClass::new("Articles").resolver("all", |_req: ResolveRequest| async move {
            Ok(json!([
                {"title": "Warp", "status": "LIVE"},
                {"title": "Weft", "status": "DRAFT"},
            ]))
        }));
        resolvers
    }

    #[tokio::test]
    async fn test_execute_query() {
        let schema = registry().executable_schema(&resolvers()).unwrap();
        let response = schema.execute("{ all { title status } first { title } }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "all": [
                    {"title": "Warp", "status": "LIVE"},
                    {"title": "Weft", "status": "DRAFT"},
                ],
                "first": {"title": "Warp"},
            })
        );
    }

    #[test]
    fn test_unknown_resolver_class_fails_build() {
        let err = registry().executable_schema(&ResolverRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, SchemaError::Reference(_)));
    }

    #[test]
    fn test_enum_output_must_be_member_name() {
        let kinds = HashMap::from([("Status".to_string(), RuntimeKind::Enum)]);
        let expr = TypeExpr::parse("Status").unwrap();
        assert!(to_field_value(json!("LIVE"), &expr, &kinds, "Article.status").is_ok());
        assert!(to_field_value(json!(3), &expr, &kinds, "Article.status").is_err());
        assert!(to_field_value(Value::Null, &expr, &kinds, "Article.status").unwrap().is_none());
    }
}
