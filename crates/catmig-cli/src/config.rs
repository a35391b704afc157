//! Run configuration read from a TOML file.
//!
//! ```toml
//! namespace = "library-east"
//! object_type = "item"
//! source = "data/items.csv"
//! rules = "rules/items.tsv"
//! reference_dir = "reference"
//! schema_dir = "schemas"
//! output = "out/items.jsonl"
//! output_mode = "json-lines"
//! retry_file = "out/items.retry.jsonl"
//! report_file = "out/items.report.json"
//! workers = 4
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use catmig_ingest::SourceFormat;
use catmig_model::ObjectType;
use catmig_report::{DEFAULT_MAX_EXAMPLES, OutputMode};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Tenant or library namespace all identifiers are derived in.
    pub namespace: String,
    pub object_type: ObjectType,
    pub source: PathBuf,
    /// Guessed from the source file extension when absent.
    #[serde(default)]
    pub source_format: Option<SourceFormat>,
    pub rules: PathBuf,
    #[serde(default = "default_reference_dir")]
    pub reference_dir: PathBuf,
    /// Tables to load beyond those the rules look up.
    #[serde(default)]
    pub reference_tables: Vec<String>,
    /// Records are not schema-checked when absent.
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
    /// Records are mapped and counted but not written when absent.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub output_mode: OutputMode,
    #[serde(default)]
    pub retry_file: Option<PathBuf>,
    #[serde(default)]
    pub report_file: Option<PathBuf>,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub max_records: Option<usize>,
    /// Column tried before the object type's usual legacy-id columns.
    #[serde(default)]
    pub legacy_id_column: Option<String>,
}

fn default_reference_dir() -> PathBuf {
    PathBuf::from("reference")
}

fn default_max_examples() -> usize {
    DEFAULT_MAX_EXAMPLES
}

fn default_workers() -> usize {
    1
}

impl MigrationConfig {
    /// Read and check a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), object_type = %config.object_type, "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.check()?;
        Ok(config)
    }

    /// Make every relative path relative to `base` instead.
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        join(&mut self.source);
        join(&mut self.rules);
        join(&mut self.reference_dir);
        for path in [
            &mut self.schema_dir,
            &mut self.output,
            &mut self.retry_file,
            &mut self.report_file,
        ]
        .into_iter()
        .flatten()
        {
            join(path);
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            bail!("namespace must not be empty");
        }
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }

    /// Source format, from the file or guessed from the source extension.
    pub fn source_format(&self) -> Result<SourceFormat> {
        match self.source_format {
            Some(format) => Ok(format),
            None => SourceFormat::from_path(&self.source).with_context(|| {
                format!(
                    "cannot tell the format of {}; set source_format",
                    self.source.display()
                )
            }),
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(source) = overrides.source {
            self.source = source;
            // A new source may have a different layout.
            if overrides.source_format.is_none() {
                self.source_format = None;
            }
        }
        if let Some(format) = overrides.source_format {
            self.source_format = Some(format);
        }
        if let Some(output) = overrides.output {
            self.output = Some(output);
        }
        if let Some(mode) = overrides.output_mode {
            self.output_mode = mode;
        }
        if let Some(path) = overrides.retry_file {
            self.retry_file = Some(path);
        }
        if let Some(path) = overrides.report_file {
            self.report_file = Some(path);
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(max) = overrides.max_records {
            self.max_records = Some(max);
        }
        if overrides.dry_run {
            self.output = None;
            self.retry_file = None;
        }
        self.check()
    }
}

/// Values given on the command line, which win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub source_format: Option<SourceFormat>,
    pub output: Option<PathBuf>,
    pub output_mode: Option<OutputMode>,
    pub retry_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
    pub workers: Option<usize>,
    pub max_records: Option<usize>,
    /// Map and report without writing records or retries.
    pub dry_run: bool,
}
