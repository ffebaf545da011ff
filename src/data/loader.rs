use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{Array, AsArray, StringArray};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::model::{Field, Paper, PaperTable, Schema};
use super::synth::synthesize;
use crate::error::{ExplorerError, Result};

// ---------------------------------------------------------------------------
// Fallback policy and load outcome
// ---------------------------------------------------------------------------

/// What to do when the source file cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Synthesize a sample dataset when the file is missing or unreadable.
    #[default]
    Always,
    /// Synthesize only when the file is missing; unreadable files are errors.
    MissingOnly,
    /// Never synthesize.
    Never,
}

impl FallbackPolicy {
    /// Whether `err` should be answered with synthetic data under this policy.
    pub fn covers(self, err: &ExplorerError) -> bool {
        match (self, err) {
            (FallbackPolicy::Always, e) => e.is_load_failure(),
            (FallbackPolicy::MissingOnly, ExplorerError::SourceNotFound(_)) => true,
            _ => false,
        }
    }
}

/// Parameters for [`load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub fallback: FallbackPolicy,
    pub seed: u64,
    pub sample_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::Always,
            seed: super::synth::DEFAULT_SEED,
            sample_size: super::synth::DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Where a loaded table came from.
#[derive(Debug)]
pub enum DataOrigin {
    File(PathBuf),
    /// Generated because the source could not be used; `cause` says why.
    Synthesized { cause: ExplorerError },
}

impl DataOrigin {
    pub fn is_synthesized(&self) -> bool {
        matches!(self, DataOrigin::Synthesized { .. })
    }

    /// One-line human description for status bars and logs.
    pub fn describe(&self) -> String {
        match self {
            DataOrigin::File(p) => format!("loaded from {}", p.display()),
            DataOrigin::Synthesized { cause } => format!("synthetic sample ({cause})"),
        }
    }
}

/// A table together with its origin.
#[derive(Debug)]
pub struct Loaded {
    pub table: PaperTable,
    pub origin: DataOrigin,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load `path`, substituting a synthetic dataset according to `options.fallback`.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Loaded> {
    match load_file(path) {
        Ok(table) => {
            log::info!(
                "Loaded {} papers with {} columns from {}",
                table.len(),
                table.schema.len(),
                path.display()
            );
            Ok(Loaded {
                table,
                origin: DataOrigin::File(path.to_path_buf()),
            })
        }
        Err(err) if options.fallback.covers(&err) => {
            match &err {
                ExplorerError::SourceNotFound(_) => log::warn!(
                    "{} not found; synthesizing {} sample papers",
                    path.display(),
                    options.sample_size
                ),
                other => log::warn!(
                    "Could not use {}: {other}; synthesizing {} sample papers instead",
                    path.display(),
                    options.sample_size
                ),
            }
            Ok(Loaded {
                table: synthesize(options.seed, options.sample_size),
                origin: DataOrigin::Synthesized { cause: err },
            })
        }
        Err(err) => Err(err),
    }
}

/// Load a paper table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one paper per line (CORD-19 `metadata.csv`)
/// * `.json`    – `[{ "cord_uid": "...", "title": "...", ... }, ...]`
/// * `.parquet` – one column per field; non-string columns are rendered as text
pub fn load_file(path: &Path) -> Result<PaperTable> {
    match std::fs::metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ExplorerError::SourceNotFound(path.to_path_buf()));
        }
        _ => {}
    }

    read_by_extension(path).map_err(|e| ExplorerError::SourceUnreadable {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })
}

fn read_by_extension(path: &Path) -> anyhow::Result<PaperTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one paper per record.
/// Empty fields are absent values. Derived columns are skipped.
pub fn read_csv<R: Read>(input: R) -> anyhow::Result<PaperTable> {
    let mut reader = csv::Reader::from_reader(input);

    let mut schema = Schema::default();
    let slots: Vec<Option<Field>> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| schema.declare(h))
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut paper = Paper::default();
        for (value, slot) in record.iter().zip(&slots) {
            if let Some(field) = slot {
                paper.set(field, Some(value.to_string()));
            }
        }
        rows.push(paper);
    }

    Ok(PaperTable::new(schema, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "cord_uid": "cord-000000", "title": "...", "journal": null, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> anyhow::Result<PaperTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        objects.push(obj);
    }

    let mut schema = Schema::default();
    let mut seen: HashSet<&str> = HashSet::new();
    for obj in &objects {
        for key in obj.keys() {
            if seen.insert(key.as_str()) {
                schema.declare(key);
            }
        }
    }

    let rows = objects
        .iter()
        .map(|obj| {
            let mut paper = Paper::default();
            for field in schema.fields() {
                paper.set(field, obj.get(field.name()).and_then(json_to_text));
            }
            paper
        })
        .collect();

    Ok(PaperTable::new(schema, rows))
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of paper metadata.
///
/// Every column becomes a field; string columns are read directly and other
/// types (dates, integers, ...) are rendered with Arrow's display formatting.
/// Works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> anyhow::Result<PaperTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let mut schema = Schema::default();
    let slots: Vec<(usize, Field)> = builder
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter_map(|(i, f)| schema.declare(f.name()).map(|field| (i, field)))
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let mut paper = Paper::default();
            for (col_idx, field) in &slots {
                let value = extract_text(batch.column(*col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", field.name()))?;
                paper.set(field, value);
            }
            rows.push(paper);
        }
    }

    Ok(PaperTable::new(schema, rows))
}

/// Extract a single cell from an Arrow column as text.
fn extract_text(col: &Arc<dyn Array>, row: usize) -> anyhow::Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(s) => s.value(row).to_string(),
            None => bail!("expected StringArray"),
        },
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        _ => array_value_to_string(col, row)?,
    };
    Ok(Some(text))
}
