use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::model::{CleanedPaper, CleanedTable, Column, Paper, PaperTable};

// ---------------------------------------------------------------------------
// Missing-value report
// ---------------------------------------------------------------------------

/// Absent-value count for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub count: usize,
    /// `count / total_rows * 100`.
    pub percentage: f64,
}

/// Columns with at least one absent value, most-missing first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingReport {
    pub total_rows: usize,
    pub entries: Vec<MissingEntry>,
}

impl MissingReport {
    /// Build from `(column, absent count)` pairs. Zero counts are dropped;
    /// the sort is stable so equal counts keep column order.
    pub fn from_counts<I>(total_rows: usize, counts: I) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut entries: Vec<MissingEntry> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(column, count)| MissingEntry {
                column,
                count,
                percentage: if total_rows == 0 {
                    0.0
                } else {
                    count as f64 / total_rows as f64 * 100.0
                },
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        MissingReport { total_rows, entries }
    }

    /// Report over a raw table.
    pub fn for_papers(table: &PaperTable) -> Self {
        let counts = table.schema.fields().iter().map(|field| {
            let absent = table
                .rows
                .iter()
                .filter(|p| p.value(field).is_none())
                .count();
            (field.name().to_string(), absent)
        });
        Self::from_counts(table.len(), counts)
    }

    /// Report over a cleaned table, base and derived columns alike.
    pub fn for_cleaned(table: &CleanedTable) -> Self {
        let base = table.schema.fields().iter().map(|field| {
            let absent = table.rows.iter().filter(|r| r.cell(field).is_none()).count();
            (field.name().to_string(), absent)
        });
        let derived = table.derived.iter().map(|&d| {
            let absent = table
                .rows
                .iter()
                .filter(|r| r.derived_cell(d).is_none())
                .count();
            (d.header().to_string(), absent)
        });
        Self::from_counts(table.len(), base.chain(derived).collect::<Vec<_>>())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Output of [`clean`].
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: CleanedTable,
    /// Missing values of the input, before any cleaning.
    pub missing: MissingReport,
    pub duplicates_removed: usize,
    /// Timestamps present in the input that could not be parsed.
    pub unparsed_dates: usize,
}

/// Clean a raw table: type dates, derive fields, trim categoricals and drop duplicate titles.
///
/// Which derived fields exist is decided once from the table schema; rows
/// are never rejected. Duplicates are detected by title, first occurrence
/// wins, and rows without a title share a single key. A table with no title
/// column is not deduplicated.
pub fn clean(table: &PaperTable) -> Cleaned {
    let missing = MissingReport::for_papers(table);
    let derived = table.schema.derived_columns();
    let dedup = table.schema.has(Column::Title);

    let mut unparsed_dates = 0;
    let mut seen: HashSet<Option<&str>> = HashSet::new();
    let mut rows = Vec::with_capacity(table.len());

    for paper in &table.rows {
        if dedup && !seen.insert(paper.title.as_deref()) {
            continue;
        }
        let row = derive(paper);
        if paper.publish_time.is_some() && row.published.is_none() {
            unparsed_dates += 1;
            log::debug!(
                "Unparseable publish_time {:?} for {}",
                paper.publish_time,
                paper.cord_uid.as_deref().unwrap_or("<no id>")
            );
        }
        rows.push(row);
    }

    let duplicates_removed = table.len() - rows.len();
    log::info!(
        "Cleaned {} papers: {} duplicate titles removed, {} unparseable dates",
        rows.len(),
        duplicates_removed,
        unparsed_dates
    );

    Cleaned {
        table: CleanedTable {
            schema: table.schema.clone(),
            derived,
            rows,
        },
        missing,
        duplicates_removed,
        unparsed_dates,
    }
}

/// Compute the derived fields of a single paper.
pub fn derive(paper: &Paper) -> CleanedPaper {
    let mut base = paper.clone();
    base.journal = trimmed(&paper.journal);
    base.source = trimmed(&paper.source);

    let published = paper.publish_time.as_deref().and_then(parse_date);
    let title = base.title.as_deref();
    let abstract_text = base.abstract_text.as_deref();

    CleanedPaper {
        publication_year: published.map(|d| d.year()),
        publication_month: published.map(|d| d.month()),
        published,
        title_length: title.map(char_count),
        title_word_count: title.map(word_count),
        has_abstract: abstract_text.is_some(),
        abstract_length: abstract_text.map(char_count),
        abstract_word_count: abstract_text.map(word_count),
        has_journal: base.journal.is_some(),
        paper: base,
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y %b %d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a publication timestamp. Returns `None` for anything unrecognised.
///
/// Partial dates are pinned to the first day: `2020-03` → 2020-03-01,
/// `2020` → 2020-01-01.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Some((y, m)) = s.split_once('-') {
        if let (Ok(y), Ok(m)) = (y.parse::<i32>(), m.parse::<u32>()) {
            return NaiveDate::from_ymd_opt(y, m, 1);
        }
    }
    if s.len() == 4 {
        if let Ok(y) = s.parse::<i32>() {
            return NaiveDate::from_ymd_opt(y, 1, 1);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::model::DerivedColumn;
    use crate::data::synth::synthesize;

    fn table(csv: &str) -> PaperTable {
        read_csv(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let t = table(
            "cord_uid,title,abstract,journal,publish_time,source_x\n\
             a,COVID-19 and vaccination,Two words,  Lancet  ,2020-04-15, PMC \n\
             b,Second,,   ,not a date,WHO\n",
        );
        let cleaned = clean(&t);
        let first = &cleaned.table.rows[0];
        assert_eq!(first.publication_year, Some(2020));
        assert_eq!(first.publication_month, Some(4));
        assert_eq!(first.title_length, Some(24));
        assert_eq!(first.title_word_count, Some(3));
        assert!(first.has_abstract);
        assert_eq!(first.abstract_length, Some(9));
        assert_eq!(first.abstract_word_count, Some(2));
        assert_eq!(first.journal(), Some("Lancet"));
        assert_eq!(first.source(), Some("PMC"));
        assert!(first.has_journal);

        let second = &cleaned.table.rows[1];
        assert_eq!(second.published, None);
        assert_eq!(second.publication_year, None);
        assert!(!second.has_abstract);
        assert_eq!(second.abstract_length, None);
        assert!(!second.has_journal);
        assert_eq!(cleaned.unparsed_dates, 1);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let t = table("cord_uid,title\na,Same\nb,Other\nc,Same\nd,\ne,\n");
        let cleaned = clean(&t);
        let ids: Vec<&str> = cleaned
            .table
            .rows
            .iter()
            .filter_map(|r| r.paper.cord_uid.as_deref())
            .collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
        assert_eq!(cleaned.duplicates_removed, 2);
    }

    #[test]
    fn test_clean_is_a_fixed_point() {
        let once = clean(&synthesize(42, 1500));
        let twice = clean(&once.table.to_paper_table());
        assert_eq!(twice.duplicates_removed, 0);
        assert_eq!(twice.table.len(), once.table.len());
        assert_eq!(twice.table, once.table);
    }

    #[test]
    fn test_missing_report_is_pre_cleaning_and_consistent() {
        let t = table(
            "cord_uid,title,abstract,journal\n\
             a,T1,,J\n\
             b,T1,,\n\
             c,T2,x,\n\
             d,T3,y,J\n",
        );
        let report = clean(&t).missing;
        assert_eq!(report.total_rows, 4);
        let cols: Vec<(&str, usize)> = report
            .entries
            .iter()
            .map(|e| (e.column.as_str(), e.count))
            .collect();
        assert_eq!(cols, vec![("abstract", 2), ("journal", 2)]);
        for e in &report.entries {
            let expected = e.count as f64 / report.total_rows as f64 * 100.0;
            assert!((e.percentage - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_absent_columns_are_skipped() {
        let cleaned = clean(&table("cord_uid,title\na,Only a title\n"));
        assert_eq!(
            cleaned.table.derived,
            vec![DerivedColumn::TitleLength, DerivedColumn::TitleWordCount]
        );
        assert_eq!(
            cleaned.table.headers(),
            vec!["cord_uid", "title", "title_length", "title_word_count"]
        );
    }

    #[test]
    fn test_no_title_column_keeps_every_row() {
        let cleaned = clean(&table(
            "cord_uid,journal,publish_time
             a,Lancet,2020-01-01
             b,Nature,2020-02-01
             c,Lancet,2021-03-01
",
        ));
        assert_eq!(cleaned.table.len(), 3);
        assert_eq!(cleaned.duplicates_removed, 0);
    }

    #[test]
    fn test_parse_date_forms() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_date("2020-03-15"), d(2020, 3, 15));
        assert_eq!(parse_date("2020/03/15"), d(2020, 3, 15));
        assert_eq!(parse_date("2020 Mar 15"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03-15 10:30:00"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03-15T10:30:00+02:00"), d(2020, 3, 15));
        assert_eq!(parse_date("2020-03"), d(2020, 3, 1));
        assert_eq!(parse_date("2020"), d(2020, 1, 1));
        assert_eq!(parse_date("spring 2020"), None);
        assert_eq!(parse_date("2020-13-01"), None);
    }
}
