use std::fs;
use std::path::PathBuf;

use catmig_ingest::{
    IngestError, RecordReader, SourceFormat, load_rule_table, read_delimited, read_records,
};
use catmig_model::SourceValue;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn csv_headers_are_normalized_and_values_kept() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "items.csv",
        "\u{feff} Barcode ,TITLE,Call Number\n39001, Cats ,QL 737\n",
    );
    let records = read_records(&path, SourceFormat::Csv).expect("read csv");
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.text("barcode"), Some("39001"));
    assert_eq!(record.text("Title"), Some(" Cats "));
    assert_eq!(record.text("CALL NUMBER"), Some("QL 737"));
    assert!(record.get("location").is_err());
}

#[test]
fn tsv_keeps_quotes_literally() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "users.tsv", "id\tname\nU1\t\"Doe\", Jane\n");
    let records = read_records(&path, SourceFormat::Tsv).expect("read tsv");
    assert_eq!(records[0].text("name"), Some("\"Doe\", Jane"));
}

#[test]
fn json_lines_keep_nested_fields() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "bibs.jsonl",
        "{\"001\": \"b1\", \"245\": {\"a\": \"Cats\", \"c\": \"by A.\"}}\n\n{\"001\": \"b2\"}\n",
    );
    let records = read_records(&path, SourceFormat::JsonLines).expect("read jsonl");
    assert_eq!(records.len(), 2);
    assert!(matches!(records[0].get("245"), Ok(SourceValue::Fields(_))));
    assert_eq!(records[0].select("245.a").unwrap(), vec!["Cats"]);
}

#[test]
fn json_keys_colliding_after_normalization_keep_the_first() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "items.jsonl", "{\"Barcode\": \"1\", \"barcode \": \"2\"}\n");
    let records = read_records(&path, SourceFormat::JsonLines).expect("read jsonl");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text("barcode"), Some("1"));
}

#[test]
fn bad_json_line_is_reported_and_reading_continues() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bibs.jsonl", "{\"001\": \"b1\"}\nnot json\n[1]\n{\"001\": \"b4\"}\n");
    let results: Vec<_> = RecordReader::open(&path, SourceFormat::JsonLines)
        .unwrap()
        .collect();
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    match &results[1] {
        Err(IngestError::Parse { line, .. }) => assert_eq!(*line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(results[2].is_err());
    assert!(results[3].is_ok());
}

#[test]
fn format_is_guessed_from_extension() {
    assert_eq!(SourceFormat::from_path("a.CSV".as_ref()), Some(SourceFormat::Csv));
    assert_eq!(SourceFormat::from_path("a.tsv".as_ref()), Some(SourceFormat::Tsv));
    assert_eq!(SourceFormat::from_path("a.jsonl".as_ref()), Some(SourceFormat::JsonLines));
    assert_eq!(SourceFormat::from_path("a.xlsx".as_ref()), None);
}

#[test]
fn rule_table_from_tsv_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "item_rules.tsv",
        "Target\tSource\tLookup\tMandatory\nmaterialTypeId\tmaterial\tmaterial_types\tyes\n",
    );
    let rules = load_rule_table(&path).expect("load rules");
    assert_eq!(rules.len(), 1);
    assert!(rules[0].mandatory);
}

#[test]
fn custom_delimiter_with_duplicate_headers_keeps_first_column() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "loans.txt", "Item_Id;PATRON;item_id\nI1;U7;ignored\n");
    let records: Vec<_> = read_delimited(&path, b';')
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records[0].text("item_id"), Some("I1"));
    assert_eq!(records[0].text("patron"), Some("U7"));
    assert_eq!(records[0].len(), 2);
}
