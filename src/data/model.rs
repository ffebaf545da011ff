use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

/// Date format used when a parsed publication date is written back out.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Column – a known CORD-19 metadata column
// ---------------------------------------------------------------------------

/// Base columns of the CORD-19 `metadata.csv` layout that the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    CordUid,
    Title,
    Abstract,
    Authors,
    Journal,
    PublishTime,
    Source,
    Doi,
    Pmcid,
    Url,
}

impl Column {
    /// Canonical column order of the metadata file.
    pub const ALL: [Column; 10] = [
        Column::CordUid,
        Column::Title,
        Column::Abstract,
        Column::Authors,
        Column::Journal,
        Column::PublishTime,
        Column::Source,
        Column::Doi,
        Column::Pmcid,
        Column::Url,
    ];

    /// Header name as it appears in the file.
    pub fn header(self) -> &'static str {
        match self {
            Column::CordUid => "cord_uid",
            Column::Title => "title",
            Column::Abstract => "abstract",
            Column::Authors => "authors",
            Column::Journal => "journal",
            Column::PublishTime => "publish_time",
            Column::Source => "source_x",
            Column::Doi => "doi",
            Column::Pmcid => "pmcid",
            Column::Url => "url",
        }
    }

    pub fn from_header(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// DerivedColumn – computed by the cleaner, never read from input
// ---------------------------------------------------------------------------

/// Columns the cleaner appends, listed in computation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedColumn {
    PublicationYear,
    PublicationMonth,
    TitleLength,
    TitleWordCount,
    HasAbstract,
    AbstractLength,
    AbstractWordCount,
    HasJournal,
}

impl DerivedColumn {
    pub const ALL: [DerivedColumn; 8] = [
        DerivedColumn::PublicationYear,
        DerivedColumn::PublicationMonth,
        DerivedColumn::TitleLength,
        DerivedColumn::TitleWordCount,
        DerivedColumn::HasAbstract,
        DerivedColumn::AbstractLength,
        DerivedColumn::AbstractWordCount,
        DerivedColumn::HasJournal,
    ];

    pub fn header(self) -> &'static str {
        match self {
            DerivedColumn::PublicationYear => "publication_year",
            DerivedColumn::PublicationMonth => "publication_month",
            DerivedColumn::TitleLength => "title_length",
            DerivedColumn::TitleWordCount => "title_word_count",
            DerivedColumn::HasAbstract => "has_abstract",
            DerivedColumn::AbstractLength => "abstract_length",
            DerivedColumn::AbstractWordCount => "abstract_word_count",
            DerivedColumn::HasJournal => "has_journal",
        }
    }

    pub fn from_header(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header() == name)
    }

    /// The base column this value is computed from.
    pub fn source(self) -> Column {
        match self {
            DerivedColumn::PublicationYear | DerivedColumn::PublicationMonth => Column::PublishTime,
            DerivedColumn::TitleLength | DerivedColumn::TitleWordCount => Column::Title,
            DerivedColumn::HasAbstract
            | DerivedColumn::AbstractLength
            | DerivedColumn::AbstractWordCount => Column::Abstract,
            DerivedColumn::HasJournal => Column::Journal,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – declared optional fields, checked once at load time
// ---------------------------------------------------------------------------

/// One column of a loaded table: either understood by the pipeline or carried through as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Known(Column),
    Extra(String),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Known(c) => c.header(),
            Field::Extra(name) => name,
        }
    }
}

/// Ordered list of the columns present in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Schema with every known column in canonical order (what the synthesizer produces).
    pub fn cord19() -> Self {
        Schema {
            fields: Column::ALL.into_iter().map(Field::Known).collect(),
        }
    }

    /// Build a schema from file headers, dropping derived and repeated headers.
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schema = Schema::default();
        for h in headers {
            schema.declare(h.as_ref());
        }
        schema
    }

    /// Register a header and return the field it maps to.
    ///
    /// Returns `None` for derived columns (they are recomputed, never read)
    /// and for headers already declared.
    pub fn declare(&mut self, header: &str) -> Option<Field> {
        let header = header.trim();
        if DerivedColumn::from_header(header).is_some() {
            log::debug!("Ignoring derived column '{header}' in input");
            return None;
        }
        if self.fields.iter().any(|f| f.name() == header) {
            log::warn!("Duplicate column '{header}' ignored");
            return None;
        }
        let field = match Column::from_header(header) {
            Some(c) => Field::Known(c),
            None => Field::Extra(header.to_string()),
        };
        self.fields.push(field.clone());
        Some(field)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn has(&self, column: Column) -> bool {
        self.fields.contains(&Field::Known(column))
    }

    /// Derived columns this schema supports, in computation order.
    pub fn derived_columns(&self) -> Vec<DerivedColumn> {
        DerivedColumn::ALL
            .into_iter()
            .filter(|d| self.has(d.source()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Paper – one row of the raw table
// ---------------------------------------------------------------------------

/// A single research-paper record as read from the source. Absent values are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paper {
    pub cord_uid: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub authors: Option<String>,
    pub journal: Option<String>,
    /// Raw publication timestamp text; typed by the cleaner.
    pub publish_time: Option<String>,
    pub source: Option<String>,
    pub doi: Option<String>,
    pub pmcid: Option<String>,
    pub url: Option<String>,
    /// Columns the pipeline does not interpret: column_name → value.
    pub extra: BTreeMap<String, String>,
}

impl Paper {
    pub fn get(&self, column: Column) -> Option<&str> {
        let slot = match column {
            Column::CordUid => &self.cord_uid,
            Column::Title => &self.title,
            Column::Abstract => &self.abstract_text,
            Column::Authors => &self.authors,
            Column::Journal => &self.journal,
            Column::PublishTime => &self.publish_time,
            Column::Source => &self.source,
            Column::Doi => &self.doi,
            Column::Pmcid => &self.pmcid,
            Column::Url => &self.url,
        };
        slot.as_deref()
    }

    fn slot_mut(&mut self, column: Column) -> &mut Option<String> {
        match column {
            Column::CordUid => &mut self.cord_uid,
            Column::Title => &mut self.title,
            Column::Abstract => &mut self.abstract_text,
            Column::Authors => &mut self.authors,
            Column::Journal => &mut self.journal,
            Column::PublishTime => &mut self.publish_time,
            Column::Source => &mut self.source,
            Column::Doi => &mut self.doi,
            Column::Pmcid => &mut self.pmcid,
            Column::Url => &mut self.url,
        }
    }

    /// Store a cell. Empty text is recorded as absent.
    pub fn set(&mut self, field: &Field, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        match field {
            Field::Known(c) => *self.slot_mut(*c) = value,
            Field::Extra(name) => match value {
                Some(v) => {
                    self.extra.insert(name.clone(), v);
                }
                None => {
                    self.extra.remove(name);
                }
            },
        }
    }

    pub fn value(&self, field: &Field) -> Option<&str> {
        match field {
            Field::Known(c) => self.get(*c),
            Field::Extra(name) => self.extra.get(name).map(String::as_str),
        }
    }
}

/// A loaded dataset: schema plus rows in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperTable {
    pub schema: Schema,
    pub rows: Vec<Paper>,
}

impl PaperTable {
    pub fn new(schema: Schema, rows: Vec<Paper>) -> Self {
        PaperTable { schema, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CleanedPaper – a paper plus its derived fields
// ---------------------------------------------------------------------------

/// A paper after cleaning. Derived fields are only ever set by the cleaner.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPaper {
    /// Base fields, with journal and source trimmed.
    pub paper: Paper,
    pub published: Option<NaiveDate>,
    pub publication_year: Option<i32>,
    pub publication_month: Option<u32>,
    pub title_length: Option<usize>,
    pub title_word_count: Option<usize>,
    pub has_abstract: bool,
    pub abstract_length: Option<usize>,
    pub abstract_word_count: Option<usize>,
    pub has_journal: bool,
}

impl CleanedPaper {
    pub fn title(&self) -> Option<&str> {
        self.paper.title.as_deref()
    }

    pub fn journal(&self) -> Option<&str> {
        self.paper.journal.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.paper.source.as_deref()
    }

    /// Text of a base cell as written to the snapshot. Dates are re-rendered from the parsed value.
    pub fn cell(&self, field: &Field) -> Option<String> {
        match field {
            Field::Known(Column::PublishTime) => {
                self.published.map(|d| d.format(DATE_FORMAT).to_string())
            }
            other => self.paper.value(other).map(str::to_string),
        }
    }

    /// Text of a derived cell as written to the snapshot.
    pub fn derived_cell(&self, column: DerivedColumn) -> Option<String> {
        match column {
            DerivedColumn::PublicationYear => self.publication_year.map(|v| v.to_string()),
            DerivedColumn::PublicationMonth => self.publication_month.map(|v| v.to_string()),
            DerivedColumn::TitleLength => self.title_length.map(|v| v.to_string()),
            DerivedColumn::TitleWordCount => self.title_word_count.map(|v| v.to_string()),
            DerivedColumn::HasAbstract => Some(bool_cell(self.has_abstract)),
            DerivedColumn::AbstractLength => self.abstract_length.map(|v| v.to_string()),
            DerivedColumn::AbstractWordCount => self.abstract_word_count.map(|v| v.to_string()),
            DerivedColumn::HasJournal => Some(bool_cell(self.has_journal)),
        }
    }
}

fn bool_cell(b: bool) -> String {
    let text = if b { "True" } else { "False" };
    text.to_string()
}

/// The cleaned dataset: base schema, derived columns and enriched rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    pub schema: Schema,
    pub derived: Vec<DerivedColumn>,
    pub rows: Vec<CleanedPaper>,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Output headers: base columns in schema order, then derived columns.
    pub fn headers(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .chain(self.derived.iter().map(|d| d.header().to_string()))
            .collect()
    }

    /// Copy of the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> CleanedTable {
        CleanedTable {
            schema: self.schema.clone(),
            derived: self.derived.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Strip the derived fields back off, keeping the cleaned base values.
    pub fn to_paper_table(&self) -> PaperTable {
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut p = r.paper.clone();
                p.publish_time = r.cell(&Field::Known(Column::PublishTime));
                p
            })
            .collect();
        PaperTable::new(self.schema.clone(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_skips_derived_and_duplicate_headers() {
        let schema = Schema::from_headers([
            "cord_uid",
            "title",
            "publication_year",
            "title",
            "license",
        ]);
        let names: Vec<&str> = schema.fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["cord_uid", "title", "license"]);
        assert!(schema.has(Column::Title));
        assert!(!schema.has(Column::Abstract));
    }

    #[test]
    fn test_derived_columns_follow_schema() {
        let schema = Schema::from_headers(["title", "journal"]);
        assert_eq!(
            schema.derived_columns(),
            vec![
                DerivedColumn::TitleLength,
                DerivedColumn::TitleWordCount,
                DerivedColumn::HasJournal
            ]
        );
    }

    #[test]
    fn test_paper_set_treats_empty_as_absent() {
        let mut paper = Paper::default();
        paper.set(&Field::Known(Column::Journal), Some(String::new()));
        paper.set(&Field::Extra("license".into()), Some("cc-by".into()));
        assert_eq!(paper.journal, None);
        assert_eq!(paper.value(&Field::Extra("license".into())), Some("cc-by"));
    }
}
