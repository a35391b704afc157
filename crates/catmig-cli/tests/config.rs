use std::fs;
use std::path::{Path, PathBuf};

use catmig_cli::config::{ConfigOverrides, MigrationConfig};
use catmig_ingest::SourceFormat;
use catmig_model::ObjectType;
use catmig_report::{DEFAULT_MAX_EXAMPLES, OutputMode};

const MINIMAL: &str = r#"
namespace = "library-east"
object_type = "item"
source = "data/items.csv"
rules = "rules/items.tsv"
"#;

#[test]
fn minimal_config_uses_defaults() {
    let config = MigrationConfig::parse(MINIMAL).unwrap();
    assert_eq!(config.namespace, "library-east");
    assert_eq!(config.object_type, ObjectType::Item);
    assert_eq!(config.reference_dir, PathBuf::from("reference"));
    assert_eq!(config.output_mode, OutputMode::JsonLines);
    assert_eq!(config.max_examples, DEFAULT_MAX_EXAMPLES);
    assert_eq!(config.workers, 1);
    assert!(config.output.is_none());
    assert!(config.schema_dir.is_none());
    assert_eq!(config.source_format().unwrap(), SourceFormat::Csv);
}

#[test]
fn full_config_parses_every_field() {
    let config = MigrationConfig::parse(
        r#"
namespace = "library-east"
object_type = "user"
source = "patrons.dat"
source_format = "tsv"
rules = "users.csv"
reference_dir = "/srv/reference"
reference_tables = ["patron_groups", "departments"]
schema_dir = "schemas"
output = "out/users.tsv"
output_mode = "bulk-load"
retry_file = "out/users.retry.jsonl"
report_file = "out/users.report.json"
max_examples = 2
workers = 8
max_records = 1000
legacy_id_column = "Patron Barcode"
"#,
    )
    .unwrap();
    assert_eq!(config.object_type, ObjectType::User);
    assert_eq!(config.source_format().unwrap(), SourceFormat::Tsv);
    assert_eq!(config.reference_tables, ["patron_groups", "departments"]);
    assert_eq!(config.output_mode, OutputMode::BulkLoad);
    assert_eq!(config.workers, 8);
    assert_eq!(config.max_records, Some(1000));
    assert_eq!(config.legacy_id_column.as_deref(), Some("Patron Barcode"));
}

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    let typo = format!("{MINIMAL}worker = 4\n");
    assert!(MigrationConfig::parse(&typo).is_err());

    let blank = MINIMAL.replace("library-east", "  ");
    let err = MigrationConfig::parse(&blank).unwrap_err();
    assert!(err.to_string().contains("namespace"));

    let no_workers = format!("{MINIMAL}workers = 0\n");
    assert!(MigrationConfig::parse(&no_workers).is_err());

    let bad_type = MINIMAL.replace("\"item\"", "\"widget\"");
    assert!(MigrationConfig::parse(&bad_type).is_err());
}

#[test]
fn unknown_extension_needs_explicit_format() {
    let config = MigrationConfig::parse(&MINIMAL.replace("items.csv", "items.dat")).unwrap();
    let err = config.source_format().unwrap_err();
    assert!(err.to_string().contains("source_format"));
}

#[test]
fn paths_resolve_against_the_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(
        &path,
        format!("{MINIMAL}output = \"out/items.jsonl\"\nreport_file = \"/tmp/report.json\"\n"),
    )
    .unwrap();
    let config = MigrationConfig::load(&path).unwrap();
    assert_eq!(config.source, dir.path().join("data/items.csv"));
    assert_eq!(config.rules, dir.path().join("rules/items.tsv"));
    assert_eq!(config.reference_dir, dir.path().join("reference"));
    assert_eq!(config.output, Some(dir.path().join("out/items.jsonl")));
    assert_eq!(config.report_file.as_deref(), Some(Path::new("/tmp/report.json")));
}

#[test]
fn command_line_values_win() {
    let mut config =
        MigrationConfig::parse(&format!("{MINIMAL}output = \"items.jsonl\"\nworkers = 2\n"))
            .unwrap();
    config
        .apply(ConfigOverrides {
            source: Some(PathBuf::from("other.jsonl")),
            output_mode: Some(OutputMode::BulkLoad),
            workers: Some(6),
            max_records: Some(10),
            ..ConfigOverrides::default()
        })
        .unwrap();
    assert_eq!(config.source, PathBuf::from("other.jsonl"));
    assert_eq!(config.source_format().unwrap(), SourceFormat::JsonLines);
    assert_eq!(config.output, Some(PathBuf::from("items.jsonl")));
    assert_eq!(config.output_mode, OutputMode::BulkLoad);
    assert_eq!(config.workers, 6);
    assert_eq!(config.max_records, Some(10));

    config
        .apply(ConfigOverrides {
            dry_run: true,
            ..ConfigOverrides::default()
        })
        .unwrap();
    assert!(config.output.is_none());
    assert!(config.retry_file.is_none());

    let err = config
        .apply(ConfigOverrides {
            workers: Some(0),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
    assert!(err.to_string().contains("workers"));
}
