//! End-to-end encryption of blog documents
//!
//! A blog has sensitive `title` and `body`, an `author` array of embedded
//! author sub-documents with sensitive names, and a `trash` array of
//! sensitive dynamically typed values.

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldcrypt::document::{Document, Map, Value};
use fieldcrypt::encryption::{EncryptionConfig, FieldEncryption, ReadOptions};
use fieldcrypt::keys::{FileKeyStore, KeyStore, KeyVaultNamespace, MemoryKeyStore};
use fieldcrypt::schema::{FieldDef, FieldType, Schema, SchemaRegistry};
use futures_util::future::join_all;
use serde_json::json;
use tempfile::TempDir;

fn fields(entries: Vec<(&str, FieldDef)>) -> BTreeMap<String, FieldDef> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::in_memory();
    registry
        .register(Schema::new(
            "tmp",
            "v1",
            fields(vec![("test", FieldDef::optional_string().sensitive())]),
        ))
        .unwrap();
    registry
        .register(Schema::new(
            "authors",
            "v1",
            fields(vec![
                ("firstName", FieldDef::optional_string().sensitive()),
                ("lastName", FieldDef::optional_string().sensitive()),
                ("tmp", FieldDef::optional_embedded("tmp", "v1")),
            ]),
        ))
        .unwrap();
    registry
}

fn blog_schema() -> Schema {
    Schema::new(
        "blogs",
        "v1",
        fields(vec![
            ("title", FieldDef::optional_string().sensitive()),
            ("body", FieldDef::optional_string().sensitive()),
            ("date", FieldDef::optional_int()),
            (
                "author",
                FieldDef::optional_array(FieldType::embedded("authors", "v1")),
            ),
            ("trash", FieldDef::optional_array(FieldType::Any).sensitive()),
        ]),
    )
}

fn config() -> EncryptionConfig {
    EncryptionConfig::new("5a".repeat(32), "blog-key")
}

fn blog_encryption(store: Arc<dyn KeyStore>) -> FieldEncryption {
    FieldEncryption::local(&blog_schema(), &registry(), &config(), store).unwrap()
}

fn blog() -> Value {
    Value::from(json!({
        "title": "title",
        "body": "body",
        "date": 123,
        "author": [{"firstName": "author firstName", "lastName": "author lastName"}],
        "trash": ["something string"]
    }))
}

fn author(doc: &Value, index: usize) -> Value {
    match doc.get("author") {
        Some(Value::Array(items)) => items[index].clone(),
        other => panic!("expected author array, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blog_round_trip() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let mut doc = blog();

    let encrypted = enc.encrypt_document(&mut doc).await.unwrap();
    assert_eq!(encrypted, 5);

    let title = doc.get("title").unwrap().clone();
    let body = doc.get("body").unwrap().clone();
    let first = author(&doc, 0).get("firstName").unwrap().clone();
    let last = author(&doc, 0).get("lastName").unwrap().clone();
    for blob in [&title, &body, &first, &last] {
        assert!(blob.is_opaque());
    }
    assert_ne!(title, body);
    assert_ne!(first, last);
    assert_eq!(doc.get("date"), Some(&Value::from(123_i64)));

    let decrypted = enc
        .decrypt_document(&mut doc, ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(decrypted, 5);
    assert_eq!(doc, blog());
}

#[tokio::test]
async fn test_paths_match_the_blog_schema() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    assert_eq!(
        enc.paths().to_strings(),
        vec![
            "author.*.firstName",
            "author.*.lastName",
            "author.*.tmp.test",
            "body",
            "title",
            "trash.*",
        ]
    );
    assert_eq!(enc.schema(), "blogs@v1");
}

#[tokio::test]
async fn test_encrypting_twice_is_a_no_op() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let mut doc = blog();

    enc.encrypt_document(&mut doc).await.unwrap();
    let once = doc.clone();

    assert_eq!(enc.encrypt_document(&mut doc).await.unwrap(), 0);
    assert_eq!(doc, once);
}

#[tokio::test]
async fn test_every_author_is_encrypted() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let mut doc = Value::from(json!({
        "author": [{"firstName": "a"}, {"firstName": "b"}, {"firstName": "c"}]
    }));

    assert_eq!(enc.encrypt_document(&mut doc).await.unwrap(), 3);
    for i in 0..3 {
        assert!(author(&doc, i).get("firstName").unwrap().is_opaque());
    }
}

#[tokio::test]
async fn test_trash_only_encrypts_scalars() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let original = Value::from(json!({
        "trash": ["s", 42, {"keep": "me"}, ["nested"], false]
    }));
    let mut doc = original.clone();

    assert_eq!(enc.encrypt_document(&mut doc).await.unwrap(), 2);
    let trash = match doc.get("trash") {
        Some(Value::Array(items)) => items.clone(),
        other => panic!("unexpected {:?}", other),
    };
    assert!(trash[0].is_opaque() && trash[1].is_opaque());
    assert_eq!(trash[2], Value::from(json!({"keep": "me"})));
    assert_eq!(trash[3], Value::from(json!(["nested"])));
    assert_eq!(trash[4], Value::Bool(false));

    enc.decrypt_document(&mut doc, ReadOptions::default())
        .await
        .unwrap();
    assert_eq!(doc, original);
}

#[tokio::test]
async fn test_missing_fields_are_fine() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let mut doc = Value::from(json!({"date": 1, "author": [{}]}));

    assert_eq!(enc.encrypt_document(&mut doc).await.unwrap(), 0);
    assert_eq!(doc, Value::from(json!({"date": 1, "author": [{}]})));
}

#[tokio::test]
async fn test_sub_documents_keep_their_wrapper() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));

    let mut tmp = Map::new();
    tmp.insert("test".into(), Value::from("deep"));
    let mut author_fields = Map::new();
    author_fields.insert("firstName".into(), Value::from("Ada"));
    author_fields.insert("tmp".into(), Value::from(Document::new("tmp", tmp)));
    let mut root = Map::new();
    root.insert(
        "author".into(),
        Value::Array(vec![Value::from(Document::new("authors", author_fields))]),
    );
    let original = Value::Object(root);

    let encrypted = enc.encrypt_instance(&original).await.unwrap();
    let author = author(&encrypted, 0);
    assert!(matches!(author, Value::Document(_)));
    assert!(author.get("firstName").unwrap().is_opaque());
    assert!(author.get("tmp").unwrap().get("test").unwrap().is_opaque());

    assert_eq!(enc.decrypt_instance(&encrypted).await.unwrap(), original);
}

#[tokio::test]
async fn test_deterministic_blobs_are_stable_across_instances() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let a = enc.encrypt_instance(&blog()).await.unwrap();
    let b = enc.encrypt_instance(&blog()).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_concurrent_documents_mint_one_key() {
    let temp = TempDir::new().unwrap();
    let store: Arc<dyn KeyStore> = Arc::new(FileKeyStore::new(temp.path()));
    let enc = blog_encryption(Arc::clone(&store));

    let docs: Vec<Value> = (0..10).map(|_| blog()).collect();
    let results = join_all(docs.iter().map(|doc| enc.encrypt_instance(doc))).await;
    assert!(results.iter().all(Result::is_ok));

    let keys = store.list(&KeyVaultNamespace::default()).unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_alt_names, vec!["blog-key".to_string()]);
}

#[tokio::test]
async fn test_keys_survive_a_restart() {
    let temp = TempDir::new().unwrap();

    let encrypted = {
        let enc = blog_encryption(Arc::new(FileKeyStore::new(temp.path())));
        enc.encrypt_instance(&blog()).await.unwrap()
    };

    let reopened = blog_encryption(Arc::new(FileKeyStore::new(temp.path())));
    assert_eq!(reopened.decrypt_instance(&encrypted).await.unwrap(), blog());
}

#[tokio::test]
async fn test_wrong_secret_cannot_decrypt() {
    let store: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
    let encrypted = blog_encryption(Arc::clone(&store))
        .encrypt_instance(&blog())
        .await
        .unwrap();

    let intruder = FieldEncryption::local(
        &blog_schema(),
        &registry(),
        &EncryptionConfig::new("7b".repeat(32), "blog-key"),
        store,
    )
    .unwrap();

    let mut doc = encrypted.clone();
    let err = intruder
        .decrypt_document(&mut doc, ReadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FLE_TRANSFORM");
    assert_eq!(doc, encrypted);
}

#[tokio::test]
async fn test_encrypted_documents_survive_json() {
    let enc = blog_encryption(Arc::new(MemoryKeyStore::new()));
    let encrypted = enc.encrypt_instance(&blog()).await.unwrap();

    let text = serde_json::to_string(&encrypted).unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, encrypted);
    assert_eq!(enc.decrypt_instance(&parsed).await.unwrap(), blog());
}
