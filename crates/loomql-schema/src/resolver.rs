//! Resolver references and resolver discovery.
//!
//! A resolver is never executed during assembly. Fields only record a
//! [`ResolverRef`] (`Class::method`); the runtime registry maps those
//! references to callables when an executable schema is built.

use std::fmt;
use std::sync::Arc;

use loomql_core::naming::capitalize_first;
use loomql_core::{Result, SchemaError};
use serde::{Deserialize, Serialize};

/// A `Class::method` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResolverRef {
    class: String,
    method: String,
}

impl ResolverRef {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Parses `Class::method`. The class part may itself be namespaced
    /// (`app::resolvers::Article::resolveTitle`); the method is the last segment.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        match trimmed.rsplit_once("::") {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                Ok(Self::new(class, method))
            }
            _ => Err(SchemaError::parse(
                input,
                "resolver must be written as Class::method",
            )),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for ResolverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.method)
    }
}

impl TryFrom<String> for ResolverRef {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResolverRef> for String {
    fn from(value: ResolverRef) -> Self {
        value.to_string()
    }
}

/// A source of resolver methods consulted for fields without an explicit
/// resolver.
pub trait ResolverProvider: Send + Sync {
    /// Class name used to build the resulting [`ResolverRef`].
    fn class_name(&self) -> &str;

    /// Providers are consulted highest priority first.
    fn priority(&self) -> i32 {
        0
    }

    /// Returns the method that resolves `type_name.field_name`, if any.
    fn resolver_method(&self, type_name: Option<&str>, field_name: Option<&str>) -> Option<String>;
}

/// Method names tried for a field, most specific first:
/// `resolveArticleTitle`, `resolveArticle`, `resolveTitle`, `resolve`.
pub fn candidate_methods(type_name: Option<&str>, field_name: Option<&str>) -> Vec<String> {
    let type_part = type_name.map(capitalize_first);
    let field_part = field_name.map(capitalize_first);

    let mut candidates = Vec::with_capacity(4);
    if let (Some(t), Some(f)) = (&type_part, &field_part) {
        candidates.push(format!("resolve{t}{f}"));
    }
    if let Some(t) = &type_part {
        candidates.push(format!("resolve{t}"));
    }
    if let Some(f) = &field_part {
        candidates.push(format!("resolve{f}"));
    }
    candidates.push("resolve".to_string());
    candidates
}

/// Ordered set of resolver providers.
#[derive(Clone, Default)]
pub struct ResolverDiscovery {
    providers: Vec<Arc<dyn ResolverProvider>>,
}

impl ResolverDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider, keeping the list sorted by descending priority.
    /// Providers with equal priority keep registration order.
    pub fn add(&mut self, provider: Arc<dyn ResolverProvider>) {
        let position = self
            .providers
            .iter()
            .position(|p| p.priority() < provider.priority())
            .unwrap_or(self.providers.len());
        self.providers.insert(position, provider);
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First provider answer for `type_name.field_name`.
    pub fn discover(&self, type_name: &str, field_name: &str) -> Option<ResolverRef> {
        self.providers.iter().find_map(|provider| {
            provider
                .resolver_method(Some(type_name), Some(field_name))
                .map(|method| ResolverRef::new(provider.class_name(), method))
        })
    }
}

impl fmt::Debug for ResolverDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| (p.class_name(), p.priority())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Methods {
        name: &'static str,
        priority: i32,
        methods: &'static [&'static str],
    }

    impl ResolverProvider for Methods {
        fn class_name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn resolver_method(&self, type_name: Option<&str>, field_name: Option<&str>) -> Option<String> {
            candidate_methods(type_name, field_name)
                .into_iter()
                .find(|candidate| self.methods.contains(&candidate.as_str()))
        }
    }

    #[test]
    fn test_parse_resolver_ref() {
        let r = ResolverRef::parse("ArticleResolver::resolveTitle").unwrap();
        assert_eq!(r.class(), "ArticleResolver");
        assert_eq!(r.method(), "resolveTitle");
        assert_eq!(r.to_string(), "ArticleResolver::resolveTitle");

        let r = ResolverRef::parse("app::resolvers::Article::resolve").unwrap();
        assert_eq!(r.class(), "app::resolvers::Article");

        assert!(ResolverRef::parse("resolveTitle").is_err());
        assert!(ResolverRef::parse("Class::").is_err());
    }

    #[test]
    fn test_candidate_order() {
        assert_eq!(
            candidate_methods(Some("article"), Some("title")),
            vec!["resolveArticleTitle", "resolveArticle", "resolveTitle", "resolve"]
        );
        assert_eq!(candidate_methods(None, None), vec!["resolve"]);
    }

    #[test]
    fn test_discovery_respects_priority() {
        let mut discovery = ResolverDiscovery::new();
        discovery.add(Arc::new(Methods {
            name: "Low",
            priority: 0,
            methods: &["resolveArticleTitle"],
        }));
        discovery.add(Arc::new(Methods {
            name: "High",
            priority: 10,
            methods: &["resolveTitle"],
        }));

        let found = discovery.discover("Article", "title").unwrap();
        assert_eq!(found.to_string(), "High::resolveTitle");

        assert!(discovery.discover("Article", "views").is_none());
    }
}
