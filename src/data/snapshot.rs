//! Persisted cleaned dataset: the CSV handed from the analysis run to the dashboard.

use std::io::{Read, Write};
use std::path::Path;

use super::clean::clean;
use super::loader::read_csv;
use super::model::CleanedTable;
use crate::error::{ExplorerError, Result};

/// Write `table` as CSV: base columns in schema order, then derived columns.
/// Absent values are empty fields.
pub fn write_snapshot(table: &CleanedTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_snapshot_to(table, file)?;
    log::info!("Wrote {} papers to {}", table.len(), path.display());
    Ok(())
}

pub fn write_snapshot_to<W: Write>(table: &CleanedTable, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.headers())?;

    for row in &table.rows {
        let base = table.schema.fields().iter().map(|f| row.cell(f));
        let derived = table.derived.iter().map(|&d| row.derived_cell(d));
        let record: Vec<String> = base.chain(derived).map(Option::unwrap_or_default).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Re-load a snapshot. Derived columns in the file are ignored and recomputed
/// from the base fields, which re-types the dates.
pub fn read_snapshot(path: &Path) -> Result<CleanedTable> {
    if !path.exists() {
        return Err(ExplorerError::SourceNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_snapshot_from(file).map_err(|e| match e {
        ExplorerError::SourceUnreadable { reason, .. } => ExplorerError::SourceUnreadable {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parse snapshot CSV from any reader.
pub fn read_snapshot_from<R: Read>(input: R) -> Result<CleanedTable> {
    let table = read_csv(input).map_err(|e| ExplorerError::SourceUnreadable {
        path: Default::default(),
        reason: format!("{e:#}"),
    })?;
    Ok(clean(&table).table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use crate::data::synth::synthesize;

    #[test]
    fn test_round_trip_keeps_rows_and_base_values() {
        let cleaned = clean(&synthesize(42, 400)).table;
        let mut buf = Vec::new();
        write_snapshot_to(&cleaned, &mut buf).unwrap();
        let back = read_snapshot_from(buf.as_slice()).unwrap();

        assert_eq!(back.len(), cleaned.len());
        assert_eq!(back.schema, cleaned.schema);
        assert_eq!(back.derived, cleaned.derived);
        for (a, b) in cleaned.rows.iter().zip(&back.rows) {
            for col in Column::ALL {
                assert_eq!(a.paper.get(col), b.paper.get(col), "{col}");
            }
            assert_eq!(a.published, b.published);
            assert_eq!(a.publication_year, b.publication_year);
            assert_eq!(a.abstract_length, b.abstract_length);
        }
    }

    #[test]
    fn test_header_order_is_base_then_derived() {
        let cleaned = clean(&synthesize(1, 3)).table;
        let mut buf = Vec::new();
        write_snapshot_to(&cleaned, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "cord_uid,title,abstract,authors,journal,publish_time,source_x,doi,pmcid,url,\
             publication_year,publication_month,title_length,title_word_count,\
             has_abstract,abstract_length,abstract_word_count,has_journal"
        );
    }

    #[test]
    fn test_missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot(&dir.path().join("cord19_cleaned_data.csv")).unwrap_err();
        assert!(matches!(err, ExplorerError::SourceNotFound(_)));
    }
}
