//! Build, persist, reload and execute a schema.

use std::sync::Arc;

use loomql_schema::models::{InMemoryModel, ModelCatalog};
use loomql_schema::resolver::ResolverRef;
use loomql_schema::{
    ArtifactRegistry, ArtifactStore, PersistOutcome, ResolveRequest, ResolverClass, ResolverRegistry,
    Schema, StorableSchema, TypeRegistry, print_sdl,
};
use serde_json::json;
use tempfile::TempDir;

fn catalog() -> Arc<ModelCatalog> {
    Arc::new(ModelCatalog::new(vec![
        InMemoryModel::new("app.Article")
            .field("Title", "String")
            .field("Views", "Int")
            .with_operations(["read", "readOne"])
            .with_operation_resolver("read", ResolverRef::new("Articles", "all")),
    ]))
}

fn storable() -> StorableSchema {
    let mut schema = Schema::new("default").with_model_creator(catalog());
    schema
        .apply_config(&json!({
            "models": {
                "app.Article": {
                    "fields": "*",
                    "operations": {"*": true, "read": {"plugins": {"sort": true}}}
                }
            },
            "queries": {"hello": {"type": "String", "resolver": "Articles::hello"}}
        }))
        .unwrap();
    schema.build().unwrap()
}

fn resolvers() -> ResolverRegistry {
    let mut resolvers = ResolverRegistry::with_builtins();
    resolvers.register(
        ResolverClass::new("Articles")
            .resolver("all", |_req: ResolveRequest| async move {
                Ok(json!([
                    {"ID": "1", "Title": "Bobbin", "Views": 10},
                    {"ID": "2", "Title": "Shuttle", "Views": 30},
                    {"ID": "3", "Title": "Heddle", "Views": 20},
                ]))
            })
            .resolver("hello", |_req: ResolveRequest| async move { Ok(json!("hi")) }),
    );
    resolvers
}

#[test]
fn persist_is_skipped_when_unchanged() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path(), "");
    let schema = storable();

    let first = store.persist(&schema).unwrap();
    assert!(matches!(first, PersistOutcome::Written { .. }));
    assert!(first.path().exists());

    let second = store.persist(&schema).unwrap();
    assert!(matches!(second, PersistOutcome::Unchanged { .. }));
    assert_eq!(first.hash(), second.hash());
    assert_eq!(store.current_hash("default").unwrap().as_deref(), Some(first.hash()));

    let salted = ArtifactStore::new(dir.path(), "deploy-2");
    assert_ne!(salted.persist(&schema).unwrap().hash(), first.hash());
}

#[test]
fn reloaded_artifact_serves_types_lazily() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path(), "");
    store.persist(&storable()).unwrap();

    let artifact = ArtifactRegistry::load(&store, "default").unwrap();
    let registry = TypeRegistry::new(Arc::clone(&artifact));
    assert_eq!(registry.constructed(), 0);

    let query = registry.get_type("Query").unwrap();
    let mut fields: Vec<_> = query.field_names().collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["hello", "readArticles", "readOneArticle"]);
    assert_eq!(registry.constructed(), 1);
    assert!(registry.get_type("Nope").is_err());

    let sdl = print_sdl(&store.load("default").unwrap().types);
    assert!(sdl.contains("type Query {"));
    assert!(sdl.contains("readOneArticle(id: ID!): Article"));
}

#[test]
fn missing_artifact_is_a_reference_error() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path(), "");
    let err = ArtifactRegistry::load(&store, "admin").unwrap_err();
    assert!(err.to_string().contains("No persisted schema for 'admin'"));
}

#[tokio::test]
async fn executes_sorted_paginated_query() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path(), "");
    store.persist(&storable()).unwrap();

    let artifact = ArtifactRegistry::load(&store, "default").unwrap();
    let schema = TypeRegistry::new(artifact).executable_schema(&resolvers()).unwrap();

    let response = schema
        .execute(
            "{ hello readArticles(limit: 2, sort: {views: DESC}) { \
               nodes { id title } \
               pageInfo { totalCount hasNextPage hasPreviousPage } } }",
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({
            "hello": "hi",
            "readArticles": {
                "nodes": [
                    {"id": "2", "title": "Shuttle"},
                    {"id": "3", "title": "Heddle"},
                ],
                "pageInfo": {"totalCount": 3, "hasNextPage": true, "hasPreviousPage": false},
            },
        })
    );
}

#[tokio::test]
async fn invalid_argument_surfaces_error_code() {
    let dir = TempDir::new().unwrap();
    let artifact = ArtifactStore::new(dir.path(), "").artifact(&storable()).unwrap();
    let schema = TypeRegistry::new(Arc::new(ArtifactRegistry::new(artifact)))
        .executable_schema(&resolvers())
        .unwrap();

    let response = schema.execute("{ readArticles(limit: -1) { nodes { id } } }").await;
    assert_eq!(response.errors.len(), 1);
    let extensions = response.errors[0].extensions.as_ref().unwrap();
    assert_eq!(
        extensions.get("code"),
        Some(&async_graphql::Value::from("INVALID_ARGUMENT"))
    );
}
