use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use tracing::{debug, info, info_span, warn};

use catmig_cli::config::{ConfigOverrides, MigrationConfig};
use catmig_cli::logging::Redaction;
use catmig_cli::summary::apply_table_style;
use catmig_core::MigrationEngine;
use catmig_ingest::{RecordReader, load_rule_table};
use catmig_map::{ObjectProfile, RuleSet};
use catmig_model::ObjectType;
use catmig_report::{MigrationReport, RecordWriter, RetryWriter, RunSink};
use catmig_standards::{DirectoryReferenceSource, DirectorySchemaSource, SchemaCache};

use crate::cli::{CheckRulesArgs, RunArgs};

pub fn run_migration(args: &RunArgs, redaction: Redaction) -> Result<MigrationReport> {
    let mut config = MigrationConfig::load(&args.config)?;
    config.apply(overrides(args))?;
    let span = info_span!("run", object_type = %config.object_type);
    let _guard = span.enter();

    let rules = load_rule_table(&config.rules)
        .with_context(|| format!("load rules {}", config.rules.display()))?;
    let mut builder = MigrationEngine::builder(config.object_type, config.namespace.clone())
        .rules(rules)
        .reference_tables(config.reference_tables.iter().cloned())
        .legacy_id_column(config.legacy_id_column.clone());
    if let Some(dir) = &config.schema_dir {
        let schemas = SchemaCache::new(DirectorySchemaSource::new(dir));
        let schema = schemas
            .get(config.object_type)
            .with_context(|| format!("load schema from {}", dir.display()))?;
        let documents = schemas
            .referenced_documents(&schema)
            .with_context(|| format!("load referenced schemas from {}", dir.display()))?;
        builder = builder.schema(schema).schema_documents(documents);
    }
    let engine = builder.build(&DirectoryReferenceSource::new(&config.reference_dir))?;

    let format = config.source_format()?;
    let reader = RecordReader::open(&config.source, format)
        .with_context(|| format!("open source {}", config.source.display()))?;

    let mut sink = RunSink::new(engine.new_report(config.max_examples));
    if let Some(path) = &config.output {
        sink = sink.with_records(RecordWriter::new(create_output(path)?, config.output_mode));
    }
    if let Some(path) = &config.retry_file {
        sink = sink.with_retries(RetryWriter::new(create_output(path)?));
    }

    let limit = config.max_records.unwrap_or(usize::MAX);
    engine.run_parallel(reader.take(limit), config.workers, &mut sink)?;
    let report = sink.finish().context("flush outputs")?;

    if let Some(path) = &config.report_file {
        let json = report.to_json_pretty().context("serialize report")?;
        fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    for (category, stats) in &report.failures {
        for example in &stats.examples {
            debug!(category = %category, example = redaction.value(example), "failure example");
        }
    }
    if !report.is_clean() {
        warn!(failed = report.failed_permanent, "records failed permanently");
    }
    Ok(report)
}

fn overrides(args: &RunArgs) -> ConfigOverrides {
    ConfigOverrides {
        source: args.source.clone(),
        source_format: args.source_format.map(Into::into),
        output: args.output.clone(),
        output_mode: args.mode.map(Into::into),
        retry_file: args.retry_file.clone(),
        report_file: args.report.clone(),
        workers: args.workers,
        max_records: args.max_records,
        dry_run: args.dry_run,
    }
}

fn create_output(path: &Path) -> Result<Box<dyn Write + Send>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Print the rules and any shadowing notes. Returns the number of notes.
pub fn run_check_rules(args: &CheckRulesArgs) -> Result<usize> {
    let rules = load_rule_table(&args.rules)
        .with_context(|| format!("load rules {}", args.rules.display()))?;
    let rules = RuleSet::new(args.object_type, rules)
        .with_context(|| format!("rule set for {}", args.object_type))?;

    let mut table = Table::new();
    table.set_header(vec!["Line", "Target", "Source", "Lookup", "Kind", "Flags"]);
    apply_table_style(&mut table);
    for rule in rules.rules() {
        let mut flags = Vec::new();
        if rule.required {
            flags.push("required");
        }
        if rule.mandatory {
            flags.push("mandatory");
        }
        table.add_row(vec![
            Cell::new(rule.line.map_or_else(|| "-".to_string(), |line| line.to_string())),
            Cell::new(rule.target.as_str()),
            Cell::new(rule.sources.join(" + ")),
            Cell::new(
                rule.lookup
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
            ),
            Cell::new(rule.kind),
            Cell::new(flags.join(", ")),
        ]);
    }
    println!("{table}");

    let tables: Vec<&str> = rules.lookup_tables().into_iter().collect();
    println!(
        "{} rules for {}; reference tables: {}",
        rules.len(),
        rules.object_type(),
        if tables.is_empty() {
            "none".to_string()
        } else {
            tables.join(", ")
        }
    );
    let notes = rules.lint();
    for note in &notes {
        println!("note: {note}");
    }
    Ok(notes.len())
}

pub fn run_object_types() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Object type", "Label", "Legacy id columns", "Defaults"]);
    apply_table_style(&mut table);
    for object_type in ObjectType::ALL {
        let profile = ObjectProfile::for_type(object_type);
        let defaults: Vec<String> = profile
            .defaults()
            .iter()
            .map(|(path, value)| format!("{path} = {value}"))
            .collect();
        table.add_row(vec![
            Cell::new(object_type.as_str()).fg(Color::Blue),
            Cell::new(object_type.label()),
            Cell::new(profile.legacy_id_columns().join(", ")),
            Cell::new(if defaults.is_empty() {
                "-".to_string()
            } else {
                defaults.join(", ")
            }),
        ]);
    }
    println!("{table}");
    Ok(())
}
