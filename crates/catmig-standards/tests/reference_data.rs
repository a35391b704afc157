use std::fs;

use serde_json::json;
use tempfile::TempDir;

use catmig_model::ObjectType;
use catmig_standards::testing::{InMemorySchemaSource, StaticReferenceDataSource};
use catmig_standards::{
    DirectoryReferenceSource, DirectorySchemaSource, ReferenceDataCache, ReferenceDataSource,
    Resolution, SchemaCache, StandardsError,
};

#[test]
fn directory_source_reads_tsv_csv_and_json_tables() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("locations.tsv"),
        "Legacy_Code\tTarget_Id\tName\nMAIN\tloc-1\tMain stacks\nref\tloc-2\tReference\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("material_types.csv"),
        "\u{feff}code,id,label\nbook,mt-1,Book\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("patron_groups.json"),
        r#"{"usergroups": [{"code": "staff", "id": "pg-1", "name": "Staff"}]}"#,
    )
    .unwrap();

    let source = DirectoryReferenceSource::new(dir.path());
    let mut cache = ReferenceDataCache::new();
    cache
        .load_from(&source, ["locations", "material_types", "patron_groups"])
        .unwrap();

    assert_eq!(
        cache.resolve("locations", "main").entry().unwrap().id,
        "loc-1"
    );
    assert_eq!(
        cache.resolve("material_types", "BOOK").entry().unwrap().name,
        "Book"
    );
    assert_eq!(
        cache.resolve("patron_groups", "Staff").entry().unwrap().id,
        "pg-1"
    );
    let names: Vec<_> = cache.summaries().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["locations", "material_types", "patron_groups"]);
}

#[test]
fn missing_table_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let source = DirectoryReferenceSource::new(dir.path());
    let err = source.fetch("locations").unwrap_err();
    assert!(matches!(err, StandardsError::TableUnavailable { .. }));

    let mut cache = ReferenceDataCache::new();
    assert!(cache.load_from(&source, ["locations"]).is_err());
}

#[test]
fn table_without_code_column_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("locations.csv"), "key,id\nmain,loc-1\n").unwrap();
    let err = DirectoryReferenceSource::new(dir.path())
        .fetch("locations")
        .unwrap_err();
    assert!(matches!(err, StandardsError::MissingColumn { ref column, .. } if column == "code"));
}

#[test]
fn static_source_feeds_the_cache() {
    let source = StaticReferenceDataSource::new()
        .with_table("material_type", [("book", "mt-1", "Book"), ("*", "mt-0", "Unspecified")]);
    let mut cache = ReferenceDataCache::new();
    cache.load_from(&source, ["material_type"]).unwrap();
    assert!(matches!(
        cache.resolve("material_type", "map"),
        Resolution::Fallback(entry) if entry.id == "mt-0"
    ));
}

#[test]
fn schema_cache_fetches_once() {
    let source = InMemorySchemaSource::new()
        .with_schema(ObjectType::Instance, json!({"type": "object"}));
    let cache = SchemaCache::new(source);
    let first = cache.get(ObjectType::Instance).unwrap();
    let second = cache.get(ObjectType::Instance).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.source().fetch_count(), 1);
    assert!(matches!(
        cache.get(ObjectType::Item),
        Err(StandardsError::SchemaUnavailable { .. })
    ));
}

#[test]
fn schema_that_is_not_an_object_is_invalid() {
    let source = InMemorySchemaSource::new().with_schema(ObjectType::User, json!([1, 2]));
    let cache = SchemaCache::new(source);
    assert!(matches!(
        cache.get(ObjectType::User),
        Err(StandardsError::InvalidSchema { .. })
    ));
}

#[test]
fn directory_schema_source_reads_by_object_type_name() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("holdings.json"),
        r#"{"type": "object", "required": ["instanceId"]}"#,
    )
    .unwrap();
    let cache = SchemaCache::new(DirectorySchemaSource::new(dir.path()));
    let schema = cache.get(ObjectType::Holdings).unwrap();
    assert_eq!(schema["required"][0], "instanceId");
}

#[test]
fn referenced_documents_are_followed_transitively_and_cached() {
    let source = InMemorySchemaSource::new()
        .with_schema(
            ObjectType::Item,
            json!({
                "properties": {
                    "holdingsRecordId": {"$ref": "uuid.json"},
                    "notes": {"items": {"$ref": "common.json#/definitions/note"}},
                    "status": {"$ref": "#/definitions/status"}
                },
                "definitions": {"status": {"enum": [{"$ref": "not-a-reference.json"}]}}
            }),
        )
        .with_document("uuid.json", json!({"type": "string", "format": "uuid"}))
        .with_document(
            "common.json",
            json!({"definitions": {"note": {"properties": {"by": {"$ref": "uuid.json"}}}}}),
        );
    let cache = SchemaCache::new(source);
    let schema = cache.get(ObjectType::Item).unwrap();

    let documents = cache.referenced_documents(&schema).unwrap();
    assert_eq!(
        documents.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["common.json", "uuid.json"]
    );
    cache.referenced_documents(&schema).unwrap();
    assert_eq!(cache.source().fetch_count(), 3);
}

#[test]
fn missing_referenced_document_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("item.json"),
        r#"{"properties": {"holdingsRecordId": {"$ref": "uuid.json"}}}"#,
    )
    .unwrap();
    let cache = SchemaCache::new(DirectorySchemaSource::new(dir.path()));
    let schema = cache.get(ObjectType::Item).unwrap();
    assert!(matches!(
        cache.referenced_documents(&schema),
        Err(StandardsError::SchemaDocumentUnavailable { ref name, .. }) if name == "uuid.json"
    ));

    fs::write(dir.path().join("uuid.json"), r#"{"type": "string"}"#).unwrap();
    let documents = cache.referenced_documents(&schema).unwrap();
    assert_eq!(documents["uuid.json"]["type"], "string");
}

#[test]
fn directory_schema_source_stays_inside_its_directory() {
    let dir = TempDir::new().unwrap();
    let source = DirectorySchemaSource::new(dir.path().join("schemas"));
    assert!(matches!(
        catmig_standards::SchemaSource::fetch_document(&source, "../secrets.json"),
        Err(StandardsError::SchemaDocumentUnavailable { .. })
    ));
}
