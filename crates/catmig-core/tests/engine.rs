use std::fs::{self, File};
use std::sync::Arc;

use serde_json::json;

use catmig_core::MigrationEngine;
use catmig_ingest::{IngestError, RecordReader, SourceFormat};
use catmig_map::{RuleMapper, RuleSet};
use catmig_model::{
    IdentifierGenerator, MappingRule, ObjectType, SourceRecord, generate,
};
use catmig_report::{MigrationReport, OutputMode, RecordWriter, RetryWriter, RunSink};
use catmig_standards::ReferenceDataCache;
use catmig_standards::testing::StaticReferenceDataSource;
use catmig_validate::SchemaDocuments;

const NAMESPACE: &str = "library-east";

fn item_rules() -> Vec<MappingRule> {
    vec![
        MappingRule::new("title", "title").unwrap(),
        MappingRule::new("materialTypeId", "material")
            .unwrap()
            .with_lookup("material_type")
            .unwrap(),
    ]
}

fn item_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "format": "uuid"},
            "title": {"type": "string"},
            "materialTypeId": {"type": "string"}
        },
        "required": ["id", "title", "materialTypeId"],
        "additionalProperties": false
    })
}

fn reference_source() -> StaticReferenceDataSource {
    StaticReferenceDataSource::new()
        .with_table("material_type", [("book", "mt-1", "Book"), ("dvd", "mt-2", "Video")])
}

fn engine() -> MigrationEngine {
    MigrationEngine::builder(ObjectType::Item, NAMESPACE)
        .rules(item_rules())
        .schema(Arc::new(item_schema()))
        .build(&reference_source())
        .unwrap()
}

fn row(legacy_id: &str, title: &str, material: &str) -> SourceRecord {
    SourceRecord::from_row([
        ("legacy_id", legacy_id),
        ("title", title),
        ("material", material),
    ])
}

#[test]
fn end_to_end_item_succeeds() {
    let outcome = engine().process(row("L1", "Cats", "book"));
    let transaction = &outcome.transaction;
    assert!(transaction.was_successful());
    assert!(!transaction.should_be_retried());
    assert_eq!(
        transaction.result().unwrap().to_value(),
        json!({
            "id": generate(NAMESPACE, "L1", ObjectType::Item).to_string(),
            "title": "Cats",
            "materialTypeId": "mt-1",
        })
    );
    assert!(outcome.source.is_none());
}

#[test]
fn schema_failure_is_permanent() {
    // No title column: the title rule writes nothing, the schema needs it.
    let record = SourceRecord::from_row([("legacy_id", "L2"), ("material", "dvd")]);
    let outcome = engine().process(record);
    let transaction = &outcome.transaction;
    assert!(!transaction.was_successful());
    assert!(!transaction.should_be_retried());
    assert!(transaction.result().is_none());
    assert_eq!(transaction.failure_category(), Some("Schema violation"));
    assert_eq!(transaction.error_message(), Some("title: required field is missing"));
}

#[test]
fn missing_reference_table_is_retried_with_its_source() {
    // Built without loading the table the rule looks up.
    let rules = RuleSet::new(ObjectType::Item, item_rules()).unwrap();
    let engine = MigrationEngine::new(
        Box::new(RuleMapper::new(rules)),
        ReferenceDataCache::new(),
        IdentifierGenerator::new(NAMESPACE),
    );
    let outcome = engine.process(row("L3", "Dogs", "book"));
    assert!(outcome.transaction.should_be_retried());
    assert_eq!(outcome.transaction.legacy_id(), Some("L3"));
    assert_eq!(outcome.source.unwrap().text("title"), Some("Dogs"));
}

#[test]
fn builder_fails_when_reference_data_is_missing() {
    let err = MigrationEngine::builder(ObjectType::Item, NAMESPACE)
        .rules(item_rules())
        .reference_tables(["locations"])
        .build(&reference_source())
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("locations"));
}

#[test]
fn builder_rejects_empty_rules() {
    let err = MigrationEngine::builder(ObjectType::Item, NAMESPACE)
        .build(&reference_source())
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("no mapping rules for item"));
}

#[test]
fn sibling_schema_documents_are_validated() {
    let schema = json!({
        "type": "object",
        "properties": {"materialTypeId": {"$ref": "uuid.json"}}
    });
    let err = MigrationEngine::builder(ObjectType::Item, NAMESPACE)
        .rules(item_rules())
        .schema(Arc::new(schema.clone()))
        .build(&reference_source())
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("unresolvable $ref 'uuid.json'"));

    let engine = MigrationEngine::builder(ObjectType::Item, NAMESPACE)
        .rules(item_rules())
        .schema(Arc::new(schema))
        .schema_documents(SchemaDocuments::from([(
            "uuid.json".to_string(),
            Arc::new(json!({"type": "string", "format": "uuid"})),
        )]))
        .build(&reference_source())
        .unwrap();
    let outcome = engine.process(row("L4", "Owls", "book"));
    assert_eq!(
        outcome.transaction.error_message(),
        Some("materialTypeId: not a valid uuid")
    );
}

fn inputs() -> Vec<Result<SourceRecord, IngestError>> {
    let mut items: Vec<Result<SourceRecord, IngestError>> = (0..200)
        .map(|n| {
            let material = if n % 10 == 0 { "vinyl" } else { "book" };
            Ok(row(&format!("L{n}"), "Title", material))
        })
        .collect();
    items.push(Err(IngestError::Parse {
        path: "items.jsonl".into(),
        line: 7,
        message: "expected value".to_string(),
    }));
    items
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let engine = engine();

    let mut sequential = RunSink::new(MigrationReport::new(ObjectType::Item, 3));
    engine.run(inputs(), &mut sequential).unwrap();
    let sequential = sequential.finish().unwrap();

    let mut parallel = RunSink::new(engine.new_report(3));
    engine.run_parallel(inputs(), 4, &mut parallel).unwrap();
    let parallel = parallel.finish().unwrap();

    for report in [&sequential, &parallel] {
        assert_eq!(report.processed, 201);
        // An unknown optional code leaves materialTypeId unset, which the
        // schema rejects.
        assert_eq!(report.failures["Schema violation"].count, 20);
        assert_eq!(report.failures["Unreadable source record"].count, 1);
        assert_eq!(report.succeeded, 180);
        assert_eq!(report.unresolved_lookups["material_type"]["vinyl"], 20);
    }
    assert_eq!(parallel.reference_tables.len(), 1);
    assert_eq!(parallel.reference_tables[0].name, "material_type");
}

#[test]
fn csv_file_to_output_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("items.csv");
    fs::write(
        &input,
        "legacy_id,title,material\nL1,Cats,book\nL2,Birds,vinyl\nL3,Dogs,DVD\n",
    )
    .unwrap();
    let output = dir.path().join("items.jsonl");
    let retries = dir.path().join("retry.jsonl");

    let engine = engine();
    let mut sink = RunSink::new(engine.new_report(5))
        .with_records(RecordWriter::new(
            Box::new(File::create(&output).unwrap()),
            OutputMode::JsonLines,
        ))
        .with_retries(RetryWriter::new(Box::new(File::create(&retries).unwrap())));
    let reader = RecordReader::open(&input, SourceFormat::Csv).unwrap();
    engine.run(reader, &mut sink).unwrap();
    let report = sink.finish().unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(
        report.failures["Schema violation"].examples,
        ["L2: materialTypeId: required field is missing"]
    );
    assert_eq!(report.warnings["Unresolved lookup"].count, 1);
    assert!(!report.is_clean());
    assert!(report.finished_at.is_some());

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["materialTypeId"], "mt-2");
    assert_eq!(
        lines[1]["id"],
        generate(NAMESPACE, "L3", ObjectType::Item).to_string()
    );
    assert_eq!(fs::read_to_string(&retries).unwrap(), "");
}
