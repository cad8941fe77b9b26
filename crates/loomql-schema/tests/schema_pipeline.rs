//! Assembly of complete schemas from configuration documents.

use std::sync::Arc;

use loomql_config::{SchemaDocument, SchemaDocuments};
use loomql_core::SchemaError;
use loomql_schema::models::{InMemoryModel, ModelCatalog};
use loomql_schema::{NamedType, Schema, StorableSchema};
use serde_json::{Value, json};

fn catalog() -> Arc<ModelCatalog> {
    Arc::new(ModelCatalog::new(vec![
        InMemoryModel::new("app.Article")
            .field("Title", "String")
            .field("Views", "Int")
            .relation("Author", "app.Author", false),
        InMemoryModel::new("app.Author").field("Name", "String"),
        InMemoryModel::new("app.Tag"),
    ]))
}

fn build(documents: &[Value]) -> loomql_core::Result<StorableSchema> {
    let mut schema = Schema::new("default").with_model_creator(catalog());
    for document in documents {
        schema.apply_config(document)?;
    }
    schema.build()
}

fn object<'a>(schema: &'a StorableSchema, name: &str) -> &'a loomql_schema::ObjectType {
    match schema.get(name) {
        Some(NamedType::Object(object)) => object,
        other => panic!("{name} should be an object type, got {other:?}"),
    }
}

#[test]
fn article_model_with_all_operations() {
    let schema = build(&[json!({
        "models": {"app.Article": {"fields": "*", "operations": "*"}}
    })])
    .unwrap();

    let query = schema.query().unwrap();
    let read = query.field("readArticles").unwrap();
    assert_eq!(read.type_ref().unwrap().to_string(), "readArticlesConnection!");
    assert!(schema.exists("readArticlesConnection"));
    assert!(schema.exists("PageInfo"));

    let read_one = query.field("readOneArticle").unwrap();
    assert_eq!(read_one.argument("id").unwrap().type_ref().to_string(), "ID!");

    let mutation = schema.mutation().unwrap();
    let create = mutation.field("createArticle").unwrap();
    assert_eq!(
        create.argument("input").unwrap().type_ref().to_string(),
        "ArticleCreateInputType!"
    );
    assert!(object(&schema, "ArticleCreateInputType").is_input());
    assert!(mutation.field("updateArticle").is_some());
    assert!(mutation.field("deleteArticles").is_some());

    let article = object(&schema, "Article");
    assert!(article.field("title").is_some());
    assert!(article.field("views").is_some());
    assert_eq!(schema.context().property_for("Article", "title"), "Title");
    assert_eq!(schema.context().type_for_class("app.Article"), Some("Article"));

    for ty in schema.types() {
        if let NamedType::Object(object) = ty
            && !object.is_input()
        {
            for field in object.fields().values() {
                assert!(field.resolver().is_some(), "{}.{} has no resolver", object.name(), field.name());
            }
        }
    }
}

#[test]
fn documents_for_one_key_merge_in_load_order() {
    let mut documents = SchemaDocuments::new();
    documents.push(SchemaDocument::new(
        "a.toml",
        json!({"types": {"Post": {"description": "first", "fields": {"title": "String"}}}, "queries": {"posts": "[Post]"}}),
    ).unwrap());
    documents.push(SchemaDocument::new(
        "b.toml",
        json!({"types": {"Post": {"description": "second", "fields": {"title": "Int", "body": "String"}}}}),
    ).unwrap());
    documents.push(SchemaDocument::new(
        "admin.toml",
        json!({"schema": "admin", "queries": {"stats": "Int"}}),
    ).unwrap());

    let mut schema = Schema::new("default").with_model_creator(catalog());
    schema.apply_documents(&documents).unwrap();
    let storable = schema.build().unwrap();

    let post = object(&storable, "Post");
    assert_eq!(post.description(), Some("second"));
    assert_eq!(post.field("title").unwrap().type_ref().unwrap().to_string(), "String");
    assert!(post.field("body").is_some());
    assert!(storable.query().unwrap().field("stats").is_none());
}

#[test]
fn field_arguments_are_unioned_first_declaration_wins() {
    let schema = build(&[
        json!({"queries": {"search": {"type": "[String]", "args": {"term": "String!"}}}}),
        json!({"queries": {"search": {"type": "[Int]", "args": {"term": "Int", "limit": "Int"}}}}),
    ])
    .unwrap();

    let search = schema.query().unwrap().field("search").unwrap();
    assert_eq!(search.type_ref().unwrap().to_string(), "[String]");
    assert_eq!(search.argument("term").unwrap().type_ref().to_string(), "String!");
    assert!(search.argument("limit").is_some());
}

#[test]
fn unknown_model_class_fails_at_processing() {
    let mut schema = Schema::new("default").with_model_creator(catalog());
    schema
        .apply_config(&json!({"types": {"Feed": {"fields": {"items": {"model": "[app.Missing]"}}}}, "queries": {"feed": "Feed"}}))
        .unwrap();
    let err = schema.build().unwrap_err();
    assert!(matches!(err, SchemaError::Reference(_)));
    assert!(err.to_string().contains("app.Missing"));
}

#[test]
fn operations_toggle_after_wildcard() {
    let schema = build(&[json!({
        "models": {"app.Article": {"fields": "*", "operations": {"*": true, "read": false, "delete": false}}}
    })])
    .unwrap();

    let query = schema.query().unwrap();
    assert!(query.field("readArticles").is_none());
    assert!(query.field("readOneArticle").is_some());
    let mutation = schema.mutation().unwrap();
    assert!(mutation.field("createArticle").is_some());
    assert!(mutation.field("deleteArticles").is_none());
}

#[test]
fn invalid_root_keys_are_rejected() {
    let mut schema = Schema::new("default");
    let err = schema.apply_config(&json!({"queries": {}, "subscriptions": {}})).unwrap_err();
    assert!(err.to_string().contains("subscriptions"));
}

#[test]
fn empty_schema_fails_validation() {
    let err = build(&[json!({"types": {"Post": {"fields": {"title": "String"}}}})]).unwrap_err();
    assert!(matches!(err, SchemaError::Validation(_)));
}

#[test]
fn id_only_model_builds_without_create() {
    let schema = build(&[json!({"models": {"app.Tag": {"operations": "*"}}})]).unwrap();

    let mutation = schema.mutation().unwrap();
    assert!(mutation.field("createTag").is_none());
    assert!(!schema.exists("TagCreateInputType"));
    assert!(mutation.field("updateTag").is_some());
    assert!(mutation.field("deleteTags").is_some());
    assert!(schema.query().unwrap().field("readOneTag").is_some());
}
