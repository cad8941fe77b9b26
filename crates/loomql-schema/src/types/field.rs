use async_graphql_parser::parse_schema;
use async_graphql_parser::types::{TypeKind, TypeSystemDefinition};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use loomql_config::ConfigMap;
use loomql_config::keys::{assert_valid_keys, kind, optional_str};
use loomql_core::{EncodedType, Result, SchemaError, SignatureBuilder, TypeExpr, assert_valid_name, is_valid_name};
use serde_json::Value;

use super::apply_plugins_config;
use super::argument::Argument;
use crate::resolver::ResolverRef;

const FIELD_KEYS: &[&str] = &[
    "type",
    "model",
    "args",
    "description",
    "resolver",
    "resolverContext",
    "resolvedModelClass",
    "plugins",
];

/// A field on an object, input object, interface or root operation type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    type_ref: Option<TypeExpr>,
    type_as_model: Option<TypeExpr>,
    args: IndexMap<String, Argument>,
    description: Option<String>,
    resolver: Option<ResolverRef>,
    resolver_context: ConfigMap,
    middleware: Vec<ResolverRef>,
    afterware: Vec<ResolverRef>,
    plugins: IndexMap<String, Value>,
    resolved_model_class: Option<String>,
    operation_model: Option<String>,
}

impl Field {
    /// Creates a field from a name or an inline signature such as
    /// `readArticles(limit: Int = 10): [Article]` and a config value.
    ///
    /// The config may be a type string, `true` (type inferred later), `null`
    /// or a map of field keys.
    pub fn new(name_or_signature: &str, config: &Value) -> Result<Self> {
        let parsed = parse_signature(name_or_signature)?;
        let mut field = Self::named(&parsed.name)?;
        for argument in parsed.args {
            field.args.insert(argument.name().to_string(), argument);
        }

        match config {
            Value::Null | Value::Bool(true) => {}
            Value::String(ty) => field.set_type(ty, false)?,
            Value::Object(_) => field.apply_config(config)?,
            other => {
                return Err(SchemaError::config(format!(
                    "field {} config must be a type string, true or a map, got {}",
                    parsed.name,
                    kind(other)
                )));
            }
        }

        if let Some(ty) = parsed.type_ref {
            field.set_type(&ty, false)?;
        }
        Ok(field)
    }

    /// Creates an untyped field.
    pub fn named(name: &str) -> Result<Self> {
        assert_valid_name(name, "Field")?;
        Ok(Self {
            name: name.to_string(),
            type_ref: None,
            type_as_model: None,
            args: IndexMap::new(),
            description: None,
            resolver: None,
            resolver_context: ConfigMap::new(),
            middleware: Vec::new(),
            afterware: Vec::new(),
            plugins: IndexMap::new(),
            resolved_model_class: None,
            operation_model: None,
        })
    }

    /// Creates a field with a concrete type.
    pub fn with_type(name: &str, type_ref: &str) -> Result<Self> {
        let mut field = Self::named(name)?;
        field.set_type(type_ref, false)?;
        Ok(field)
    }

    pub fn apply_config(&mut self, config: &Value) -> Result<()> {
        let Some(map) = config.as_object() else {
            return Ok(());
        };
        let context = format!("field {}", self.name);
        assert_valid_keys(map, FIELD_KEYS, &context)?;

        if let Some(ty) = optional_str(map, "type", &context)? {
            self.set_type(ty, false)?;
        }
        if let Some(model) = optional_str(map, "model", &context)? {
            self.set_type_as_model(model)?;
        }
        if let Some(args) = map.get("args") {
            self.apply_args_config(args)?;
        }
        if let Some(description) = optional_str(map, "description", &context)? {
            self.description = Some(description.to_string());
        }
        if let Some(resolver) = optional_str(map, "resolver", &context)? {
            self.resolver = Some(ResolverRef::parse(resolver)?);
        }
        if let Some(resolver_context) = map.get("resolverContext") {
            let entries = resolver_context.as_object().ok_or_else(|| {
                SchemaError::config(format!("{context}.resolverContext must be a map"))
            })?;
            for (key, value) in entries {
                self.resolver_context.insert(key.clone(), value.clone());
            }
        }
        if let Some(class) = optional_str(map, "resolvedModelClass", &context)? {
            self.resolved_model_class = Some(class.to_string());
        }
        if let Some(plugins) = map.get("plugins") {
            apply_plugins_config(&mut self.plugins, plugins, &context)?;
        }
        Ok(())
    }

    /// Explicit `args` add new arguments and contribute descriptions and
    /// defaults to inline ones. An inline type is never replaced.
    fn apply_args_config(&mut self, args: &Value) -> Result<()> {
        let entries = args.as_object().ok_or_else(|| {
            SchemaError::config(format!("field {} args must be a map", self.name))
        })?;
        for (name, config) in entries {
            match self.args.get_mut(name) {
                Some(existing) => existing.apply_config(config)?,
                None => {
                    let argument = Argument::from_config(name, config)?;
                    self.args.insert(name.clone(), argument);
                }
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_ref(&self) -> Option<&TypeExpr> {
        self.type_ref.as_ref()
    }

    /// Sets the field type. `required` adds a non-null marker if the type
    /// doesn't already carry one. A leaf that isn't a GraphQL name is treated
    /// as a model class and resolved during assembly.
    pub fn set_type(&mut self, type_ref: &str, required: bool) -> Result<()> {
        let mut expr = TypeExpr::parse(type_ref)?;
        if required && !expr.is_required() {
            expr = TypeExpr::NonNull(Box::new(expr));
        }
        if is_valid_name(expr.named_type()) {
            self.type_ref = Some(expr);
            self.type_as_model = None;
        } else {
            self.type_ref = None;
            self.type_as_model = Some(expr);
        }
        Ok(())
    }

    pub fn set_type_expr(&mut self, expr: TypeExpr) {
        self.type_ref = Some(expr);
        self.type_as_model = None;
    }

    /// Defers the type to the model wrapping `class_ref`. Wrappers are kept:
    /// `[app::Article]!` becomes `[Article]!` once resolved.
    pub fn set_type_as_model(&mut self, class_ref: &str) -> Result<()> {
        self.type_as_model = Some(TypeExpr::parse(class_ref)?);
        self.type_ref = None;
        Ok(())
    }

    pub fn type_as_model(&self) -> Option<&TypeExpr> {
        self.type_as_model.as_ref()
    }

    /// True while the field still waits for model type resolution.
    pub fn needs_model_resolution(&self) -> bool {
        self.type_ref.is_none() && self.type_as_model.is_some()
    }

    pub fn args(&self) -> &IndexMap<String, Argument> {
        &self.args
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.args.get(name)
    }

    /// Adds an argument, replacing one with the same name.
    pub fn add_arg(&mut self, argument: Argument) {
        self.args.insert(argument.name().to_string(), argument);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn resolver(&self) -> Option<&ResolverRef> {
        self.resolver.as_ref()
    }

    pub fn set_resolver(&mut self, resolver: ResolverRef) {
        self.resolver = Some(resolver);
    }

    pub fn resolver_context(&self) -> &ConfigMap {
        &self.resolver_context
    }

    pub fn add_resolver_context(&mut self, key: impl Into<String>, value: Value) {
        self.resolver_context.insert(key.into(), value);
    }

    pub fn middleware(&self) -> &[ResolverRef] {
        &self.middleware
    }

    /// Middleware runs before the resolver, in insertion order.
    pub fn add_middleware(&mut self, resolver: ResolverRef) {
        if !self.middleware.contains(&resolver) {
            self.middleware.push(resolver);
        }
    }

    pub fn afterware(&self) -> &[ResolverRef] {
        &self.afterware
    }

    /// Afterware runs after the resolver, in insertion order.
    pub fn add_afterware(&mut self, resolver: ResolverRef) {
        if !self.afterware.contains(&resolver) {
            self.afterware.push(resolver);
        }
    }

    pub fn plugins(&self) -> &IndexMap<String, Value> {
        &self.plugins
    }

    pub fn add_plugin(&mut self, identifier: impl Into<String>, config: Value) {
        self.plugins.insert(identifier.into(), config);
    }

    /// Adds a plugin unless one with the same identifier is already set.
    pub fn add_default_plugin(&mut self, identifier: &str, config: Value) {
        if !self.plugins.contains_key(identifier) {
            self.plugins.insert(identifier.to_string(), config);
        }
    }

    pub fn remove_plugin(&mut self, identifier: &str) {
        self.plugins.shift_remove(identifier);
    }

    pub fn resolved_model_class(&self) -> Option<&str> {
        self.resolved_model_class.as_deref()
    }

    pub fn set_resolved_model_class(&mut self, class: impl Into<String>) {
        self.resolved_model_class = Some(class.into());
    }

    /// Name of the model type this field was generated from, for model
    /// operations.
    pub fn operation_model(&self) -> Option<&str> {
        self.operation_model.as_deref()
    }

    pub fn set_operation_model(&mut self, type_name: impl Into<String>) {
        self.operation_model = Some(type_name.into());
    }

    /// Combines a same-named field declared by a later source.
    ///
    /// The first-seen type, resolver and description are kept (the later
    /// ones only fill gaps). Arguments are unioned with the first
    /// declaration winning; plugins are unioned with the later declaration
    /// winning per identifier.
    pub fn merge_with(&mut self, other: Field) {
        if self.type_ref.is_none() && self.type_as_model.is_none() {
            self.type_ref = other.type_ref;
            self.type_as_model = other.type_as_model;
        }
        if self.resolver.is_none() {
            self.resolver = other.resolver;
        }
        if self.description.is_none() {
            self.description = other.description;
        }
        if self.resolved_model_class.is_none() {
            self.resolved_model_class = other.resolved_model_class;
        }
        for (name, argument) in other.args {
            self.args.entry(name).or_insert(argument);
        }
        for (identifier, config) in other.plugins {
            self.plugins.insert(identifier, config);
        }
        for (key, value) in other.resolver_context {
            self.resolver_context.entry(key).or_insert(value);
        }
        for resolver in other.middleware {
            self.add_middleware(resolver);
        }
        for resolver in other.afterware {
            self.add_afterware(resolver);
        }
    }

    /// The validated type reference.
    pub fn encoded_type(&self) -> Result<EncodedType> {
        match &self.type_ref {
            Some(expr) => EncodedType::from_expr(expr.clone()),
            None => Err(self.missing_type_error()),
        }
    }

    fn missing_type_error(&self) -> SchemaError {
        match &self.type_as_model {
            Some(model) => SchemaError::reference(format!(
                "Field '{}' references model '{}' which was never resolved to a type",
                self.name,
                model.named_type()
            )),
            None => SchemaError::reference(format!("Field '{}' has no type", self.name)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.encoded_type()?;
        for argument in self.args.values() {
            argument.validate()?;
        }
        Ok(())
    }

    /// Content hash over name, encoded type, resolver, description, sorted
    /// plugins and sorted argument signatures.
    pub fn signature(&self) -> String {
        let encoded = match self.encoded_type() {
            Ok(ty) => ty.encode(),
            Err(_) => self
                .type_as_model
                .as_ref()
                .map(|expr| format!("model({expr})"))
                .unwrap_or_default(),
        };
        let resolver = self.resolver.as_ref().map(ToString::to_string);
        let plugins = self
            .plugins
            .iter()
            .map(|(identifier, config)| format!("{identifier}={config}"));
        let args = self.args.values().map(Argument::signature);

        SignatureBuilder::new()
            .component("name", &self.name)
            .component("type", &encoded)
            .optional("resolver", resolver.as_deref())
            .optional("description", self.description.as_deref())
            .sorted("plugins", plugins)
            .sorted("args", args)
            .finish()
    }
}

struct ParsedSignature {
    name: String,
    args: Vec<Argument>,
    type_ref: Option<String>,
}

/// Splits `name(args): Type` into its parts.
fn parse_signature(input: &str) -> Result<ParsedSignature> {
    let trimmed = input.trim();

    let Some(open) = trimmed.find('(') else {
        if trimmed.contains(')') {
            return Err(SchemaError::parse(input, "unbalanced parentheses"));
        }
        let (name, type_ref) = match trimmed.split_once(':') {
            Some((name, ty)) => (name.trim(), Some(non_empty_type(input, ty)?)),
            None => (trimmed, None),
        };
        assert_valid_name(name, "Field")?;
        return Ok(ParsedSignature {
            name: name.to_string(),
            args: Vec::new(),
            type_ref,
        });
    };

    let name = trimmed[..open].trim();
    assert_valid_name(name, "Field")?;

    let mut depth = 0usize;
    let mut close = None;
    for (offset, ch) in trimmed[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(|| SchemaError::parse(input, "unbalanced parentheses"))?;

    let clause = &trimmed[open + 1..close];
    let rest = trimmed[close + 1..].trim();
    if rest.contains(['(', ')']) {
        return Err(SchemaError::parse(input, "unbalanced parentheses"));
    }

    let type_ref = if rest.is_empty() {
        None
    } else {
        let ty = rest
            .strip_prefix(':')
            .ok_or_else(|| SchemaError::parse(input, "expected ':' before the field type"))?;
        Some(non_empty_type(input, ty)?)
    };

    Ok(ParsedSignature {
        name: name.to_string(),
        args: parse_argument_clause(clause)?,
        type_ref,
    })
}

fn non_empty_type(input: &str, ty: &str) -> Result<String> {
    let ty = ty.trim();
    if ty.is_empty() {
        return Err(SchemaError::parse(input, "missing type after ':'"));
    }
    Ok(ty.to_string())
}

/// Parses `id: ID!, limit: Int = 5` as GraphQL argument definitions.
fn parse_argument_clause(clause: &str) -> Result<Vec<Argument>> {
    if clause.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document = format!("type ArgumentHolder {{ holder({clause}): String }}");
    let parsed = parse_schema(&document).map_err(|e| SchemaError::parse(clause, e.to_string()))?;

    let mut arguments = Vec::new();
    for definition in parsed.definitions {
        let TypeSystemDefinition::Type(type_definition) = definition else {
            continue;
        };
        let TypeKind::Object(object) = type_definition.node.kind else {
            continue;
        };
        for field in object.fields {
            for input in field.node.arguments {
                let input = input.node;
                let mut argument =
                    Argument::new(input.name.node.as_str(), &input.ty.node.to_string())?;
                if let Some(default) = input.default_value {
                    argument.set_default_value(default_to_json(default.node, clause)?)?;
                }
                if let Some(description) = input.description {
                    argument.set_description(description.node);
                }
                arguments.push(argument);
            }
        }
    }
    Ok(arguments)
}

fn default_to_json(value: ConstValue, clause: &str) -> Result<Value> {
    value.into_json().map_err(|e| SchemaError::parse(clause, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_signature() {
        let field = Field::new("readArticles(limit: Int = 5, filter: String!): [Article]", &Value::Null)
            .unwrap();
        assert_eq!(field.name(), "readArticles");
        assert_eq!(field.type_ref().unwrap().to_string(), "[Article]");
        assert_eq!(field.args().len(), 2);
        let limit = field.argument("limit").unwrap();
        assert_eq!(limit.type_ref().to_string(), "Int");
        assert_eq!(limit.default_value(), Some(&json!(5)));
        assert_eq!(field.argument("filter").unwrap().type_ref().to_string(), "String!");
    }

    #[test]
    fn test_short_type_forms() {
        let field = Field::new("title", &json!("String!")).unwrap();
        assert_eq!(field.type_ref().unwrap().to_string(), "String!");

        let field = Field::new("title: String", &Value::Null).unwrap();
        assert_eq!(field.type_ref().unwrap().to_string(), "String");

        let field = Field::new("title", &json!(true)).unwrap();
        assert!(field.type_ref().is_none());
        assert!(field.validate().is_err());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = Field::new("read(limit: Int", &Value::Null).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { ref fragment, .. } if fragment == "read(limit: Int"));

        assert!(Field::new("read limit: Int)", &Value::Null).is_err());
        assert!(Field::new("read(limit: Int)) : Int", &Value::Null).is_err());
    }

    #[test]
    fn test_missing_colon_in_argument() {
        let err = Field::new("read(limit Int)", &Value::Null).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn test_invalid_name() {
        let err = Field::new("2fast", &json!("String")).unwrap_err();
        assert!(matches!(err, SchemaError::Naming(_)));
    }

    #[test]
    fn test_invalid_keys() {
        let err = Field::new("title", &json!({"type": "String", "colour": "red"})).unwrap_err();
        assert!(err.to_string().contains("invalid keys in config"));
    }

    #[test]
    fn test_inline_args_merge_with_explicit_args() {
        let field = Field::new(
            "search(term: String!)",
            &json!({
                "type": "[Article]",
                "args": {
                    "term": {"type": "Int", "description": "Search term"},
                    "limit": {"type": "Int", "defaultValue": 10}
                }
            }),
        )
        .unwrap();
        let term = field.argument("term").unwrap();
        assert_eq!(term.type_ref().to_string(), "String!");
        assert_eq!(term.description(), Some("Search term"));
        assert_eq!(field.argument("limit").unwrap().default_value(), Some(&json!(10)));
    }

    #[test]
    fn test_set_type_required() {
        let mut field = Field::named("id").unwrap();
        field.set_type("ID", true).unwrap();
        assert_eq!(field.type_ref().unwrap().to_string(), "ID!");
        field.set_type("ID!", true).unwrap();
        assert_eq!(field.type_ref().unwrap().to_string(), "ID!");
    }

    #[test]
    fn test_class_leaf_becomes_type_as_model() {
        let field = Field::new("author", &json!("app::model::Author")).unwrap();
        assert!(field.needs_model_resolution());
        assert_eq!(field.type_as_model().unwrap().named_type(), "app::model::Author");

        let field = Field::new("authors", &json!({"model": "[App\\Author]!"})).unwrap();
        assert!(field.needs_model_resolution());
        let err = field.validate().unwrap_err();
        assert!(err.to_string().contains("never resolved"));
    }

    #[test]
    fn test_plugins_config() {
        let field = Field::new(
            "title",
            &json!({"type": "String", "plugins": {"truncate": {"length": 10}, "other": true, "gone": false}}),
        )
        .unwrap();
        assert_eq!(field.plugins().len(), 2);
        assert_eq!(field.plugins()["truncate"]["length"], 10);
        assert_eq!(field.plugins()["other"], json!({}));
    }

    #[test]
    fn test_merge_policy() {
        let mut first = Field::new(
            "title(a: String)",
            &json!({"type": "String", "description": "first", "plugins": {"p": {"v": 1}}}),
        )
        .unwrap();
        let second = Field::new(
            "title(a: Int, b: Int)",
            &json!({"type": "Int", "description": "second", "plugins": {"p": {"v": 2}, "q": true}}),
        )
        .unwrap();
        first.merge_with(second);

        assert_eq!(first.type_ref().unwrap().to_string(), "String");
        assert_eq!(first.description(), Some("first"));
        assert_eq!(first.argument("a").unwrap().type_ref().to_string(), "String");
        assert!(first.argument("b").is_some());
        assert_eq!(first.plugins()["p"]["v"], 2);
        assert!(first.plugins().contains_key("q"));
    }

    #[test]
    fn test_signature_idempotent_and_sensitive() {
        let build = || {
            Field::new(
                "title(length: Int)",
                &json!({
                    "type": "String",
                    "description": "Title",
                    "resolver": "Article::resolveTitle",
                    "plugins": {"truncate": true}
                }),
            )
            .unwrap()
        };
        let base = build().signature();
        assert_eq!(base, build().signature());

        let mut changed = build();
        changed.set_type("Int", false).unwrap();
        assert_ne!(base, changed.signature());

        let mut changed = build();
        changed.set_description("Other");
        assert_ne!(base, changed.signature());

        let mut changed = build();
        changed.set_resolver(ResolverRef::new("Other", "resolve"));
        assert_ne!(base, changed.signature());

        let mut changed = build();
        changed.add_plugin("sort", json!({}));
        assert_ne!(base, changed.signature());

        let mut changed = build();
        changed.add_arg(Argument::new("offset", "Int").unwrap());
        assert_ne!(base, changed.signature());
    }
}
