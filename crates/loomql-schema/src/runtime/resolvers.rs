//! Resolver classes and the registry the executable schema dispatches
//! through.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use loomql_config::ConfigMap;
use serde_json::Value;

use super::builtins;
use super::error::ResolveError;
use crate::resolver::{ResolverProvider, ResolverRef, candidate_methods};
use crate::schema::SchemaContext;

/// Everything a resolver chain sees for one field invocation.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub type_name: String,
    pub field_name: String,
    /// Parent object, `null` for root fields
    pub parent: Value,
    pub args: ConfigMap,
    /// The field's persisted resolver context
    pub context: ConfigMap,
    pub schema: Arc<SchemaContext>,
}

impl ResolveRequest {
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|v| !v.is_null())
    }

    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Value of `field` on the parent object, through the schema's field map.
    pub fn parent_property(&self, field: &str) -> Option<&Value> {
        let parent = self.parent.as_object()?;
        let property = self.schema.property_for(&self.type_name, field);
        parent.get(property).or_else(|| parent.get(field))
    }
}

pub type ResolveFuture = BoxFuture<'static, Result<Value, ResolveError>>;
pub type ResolveFn = Arc<dyn Fn(ResolveRequest) -> ResolveFuture + Send + Sync>;
pub type MiddlewareFn = Arc<dyn Fn(&mut ResolveRequest) -> Result<(), ResolveError> + Send + Sync>;
pub type AfterwareFn = Arc<dyn Fn(Value, &ResolveRequest) -> Result<Value, ResolveError> + Send + Sync>;

#[derive(Clone)]
enum Handler {
    Resolve(ResolveFn),
    Middleware(MiddlewareFn),
    Afterware(AfterwareFn),
}

impl Handler {
    fn role(&self) -> &'static str {
        match self {
            Self::Resolve(_) => "resolver",
            Self::Middleware(_) => "middleware",
            Self::Afterware(_) => "afterware",
        }
    }
}

/// A named set of resolver, middleware and afterware methods.
///
/// As a [`ResolverProvider`] it answers discovery for the method names it
/// defines as resolvers.
pub struct ResolverClass {
    name: String,
    priority: i32,
    methods: IndexMap<String, Handler>,
}

impl ResolverClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            methods: IndexMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn resolver<F, Fut>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(ResolveRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ResolveError>> + Send + 'static,
    {
        let f: ResolveFn = Arc::new(move |request| f(request).boxed());
        self.methods.insert(method.into(), Handler::Resolve(f));
        self
    }

    pub fn middleware<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ResolveRequest) -> Result<(), ResolveError> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), Handler::Middleware(Arc::new(f)));
        self
    }

    pub fn afterware<F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &ResolveRequest) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), Handler::Afterware(Arc::new(f)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    fn handler(&self, method: &str) -> Option<&Handler> {
        self.methods.get(method)
    }
}

impl ResolverProvider for ResolverClass {
    fn class_name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn resolver_method(&self, type_name: Option<&str>, field_name: Option<&str>) -> Option<String> {
        candidate_methods(type_name, field_name)
            .into_iter()
            .find(|method| matches!(self.methods.get(method), Some(Handler::Resolve(_))))
    }
}

impl fmt::Debug for ResolverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverClass")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolver classes by name.
#[derive(Debug, Clone, Default)]
pub struct ResolverRegistry {
    classes: IndexMap<String, Arc<ResolverClass>>,
}

impl ResolverRegistry {
    /// An empty registry; the built-in classes are not included.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `DefaultResolver`, `Paginator`, `Sorter`,
    /// `FirstResult` and `Truncator`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for class in builtins::classes() {
            registry.register(class);
        }
        registry
    }

    /// Registers a class, replacing one with the same name.
    pub fn register(&mut self, class: ResolverClass) {
        self.classes.insert(class.name.clone(), Arc::new(class));
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ResolverClass>> {
        self.classes.get(name)
    }

    /// Every class as a discovery provider, for assembly.
    pub fn providers(&self) -> Vec<Arc<dyn ResolverProvider>> {
        self.classes
            .values()
            .map(|class| Arc::clone(class) as Arc<dyn ResolverProvider>)
            .collect()
    }

    fn handler(&self, reference: &ResolverRef) -> Result<&Handler, ResolveError> {
        self.classes
            .get(reference.class())
            .and_then(|class| class.handler(reference.method()))
            .ok_or_else(|| ResolveError::unknown_resolver(reference.to_string()))
    }

    fn role_mismatch(reference: &ResolverRef, expected: &str, found: &Handler) -> ResolveError {
        ResolveError::failed(format!(
            "{reference} is registered as {}, not as {expected}",
            found.role()
        ))
    }

    pub fn resolver(&self, reference: &ResolverRef) -> Result<ResolveFn, ResolveError> {
        match self.handler(reference)? {
            Handler::Resolve(f) => Ok(Arc::clone(f)),
            other => Err(Self::role_mismatch(reference, "resolver", other)),
        }
    }

    pub fn middleware(&self, reference: &ResolverRef) -> Result<MiddlewareFn, ResolveError> {
        match self.handler(reference)? {
            Handler::Middleware(f) => Ok(Arc::clone(f)),
            other => Err(Self::role_mismatch(reference, "middleware", other)),
        }
    }

    pub fn afterware(&self, reference: &ResolverRef) -> Result<AfterwareFn, ResolveError> {
        match self.handler(reference)? {
            Handler::Afterware(f) => Ok(Arc::clone(f)),
            other => Err(Self::role_mismatch(reference, "afterware", other)),
        }
    }
}

/// Resolved middleware, resolver and afterware for one field.
#[derive(Clone)]
pub struct ResolverChain {
    middleware: Vec<MiddlewareFn>,
    resolver: ResolveFn,
    afterware: Vec<AfterwareFn>,
}

impl ResolverChain {
    pub fn build(
        registry: &ResolverRegistry,
        resolver: &ResolverRef,
        middleware: &[ResolverRef],
        afterware: &[ResolverRef],
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            middleware: middleware
                .iter()
                .map(|r| registry.middleware(r))
                .collect::<Result<_, _>>()?,
            resolver: registry.resolver(resolver)?,
            afterware: afterware
                .iter()
                .map(|r| registry.afterware(r))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Middleware in declaration order, then the resolver, then afterware
    /// in declaration order.
    pub async fn run(&self, mut request: ResolveRequest) -> Result<Value, ResolveError> {
        for middleware in &self.middleware {
            middleware(&mut request)?;
        }
        let mut value = (self.resolver)(request.clone()).await?;
        for afterware in &self.afterware {
            value = afterware(value, &request)?;
        }
        Ok(value)
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("middleware", &self.middleware.len())
            .field("afterware", &self.afterware.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ResolveRequest {
        ResolveRequest {
            type_name: "Query".into(),
            field_name: "hello".into(),
            parent: Value::Null,
            args: ConfigMap::new(),
            context: ConfigMap::new(),
            schema: Arc::new(SchemaContext::new()),
        }
    }

    fn greeter() -> ResolverClass {
        ResolverClass::new("Greeter")
            .resolver("resolveQueryHello", |req: ResolveRequest| async move {
                let name = req.arg("name").and_then(Value::as_str).unwrap_or("world").to_string();
                Ok(json!(format!("hello {name}")))
            })
            .middleware("named", |req: &mut ResolveRequest| {
                req.args.insert("name".into(), json!("loom"));
                Ok(())
            })
            .afterware("shout", |value: Value, _: &ResolveRequest| {
                Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
            })
    }

    #[test]
    fn test_discovery_only_finds_resolvers() {
        let class = greeter();
        assert_eq!(
            class.resolver_method(Some("Query"), Some("hello")),
            Some("resolveQueryHello".to_string())
        );
        assert_eq!(class.resolver_method(Some("Query"), Some("bye")), None);
    }

    #[tokio::test]
    async fn test_chain_order() {
        let mut registry = ResolverRegistry::new();
        registry.register(greeter());

        let chain = ResolverChain::build(
            &registry,
            &ResolverRef::new("Greeter", "resolveQueryHello"),
            &[ResolverRef::new("Greeter", "named")],
            &[ResolverRef::new("Greeter", "shout")],
        )
        .unwrap();
        assert_eq!(chain.run(request()).await.unwrap(), json!("HELLO LOOM"));
    }

    #[test]
    fn test_middleware_error_short_circuits() {
        let mut registry = ResolverRegistry::new();
        registry.register(greeter().middleware("reject", |_: &mut ResolveRequest| {
            Err(ResolveError::invalid_argument("name", "rejected"))
        }));

        let chain = ResolverChain::build(
            &registry,
            &ResolverRef::new("Greeter", "resolveQueryHello"),
            &[ResolverRef::new("Greeter", "reject"), ResolverRef::new("Greeter", "named")],
            &[ResolverRef::new("Greeter", "shout")],
        )
        .unwrap();
        let err = tokio_test::block_on(chain.run(request())).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidArgument { .. }));
    }

    #[test]
    fn test_unknown_and_mismatched_methods() {
        let mut registry = ResolverRegistry::new();
        registry.register(greeter());

        let err = registry.resolver(&ResolverRef::new("Greeter", "missing")).err().unwrap();
        assert!(matches!(err, ResolveError::UnknownResolver(_)));

        let err = registry.resolver(&ResolverRef::new("Greeter", "shout")).err().unwrap();
        assert_eq!(err.to_string(), "Greeter::shout is registered as afterware, not as resolver");
    }
}
