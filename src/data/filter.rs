use std::fmt;

use super::model::{CleanedPaper, CleanedTable, Column};
use crate::error::{ExplorerError, Result};

/// Sentinel label meaning "do not filter on this column".
pub const ALL: &str = "All";

// ---------------------------------------------------------------------------
// Filter criteria: independently-toggleable predicates combined by AND
// ---------------------------------------------------------------------------

/// Exact-match selection for a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Exact(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Exact(want) => value == Some(want.as_str()),
        }
    }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self {
        if s == ALL {
            Selection::All
        } else {
            Selection::Exact(s.to_string())
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Exact(s) => f.write_str(s),
        }
    }
}

/// Dashboard filter settings.
///
/// A criterion at its no-op value (`None`, [`Selection::All`], `false`) is
/// skipped. A criterion whose column the table does not carry is skipped too.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    /// Inclusive publication year bounds. Undated papers never match a set range.
    pub year_range: Option<(i32, i32)>,
    pub journal: Selection,
    pub source: Selection,
    pub require_abstract: bool,
}

impl FilterCriteria {
    /// Reject criteria that can only ever produce a wrong view.
    pub fn validate(&self) -> Result<()> {
        if let Some((lo, hi)) = self.year_range {
            if lo > hi {
                return Err(ExplorerError::InvalidCriteria(format!(
                    "year range is inverted: {lo} > {hi}"
                )));
            }
        }
        Ok(())
    }

    /// Whether every criterion is at its no-op value.
    pub fn is_noop(&self) -> bool {
        self.year_range.is_none()
            && self.journal.is_all()
            && self.source.is_all()
            && !self.require_abstract
    }
}

// ---------------------------------------------------------------------------
// Applying the criteria
// ---------------------------------------------------------------------------

/// Resolved predicates for one table: criteria on absent columns are dropped here, once.
struct Predicate<'a> {
    year_range: Option<(i32, i32)>,
    journal: Option<&'a Selection>,
    source: Option<&'a Selection>,
    require_abstract: bool,
}

impl<'a> Predicate<'a> {
    fn new(table: &CleanedTable, criteria: &'a FilterCriteria) -> Self {
        let schema = &table.schema;
        let active = |sel: &'a Selection, col: Column| (!sel.is_all() && schema.has(col)).then_some(sel);
        Predicate {
            year_range: criteria
                .year_range
                .filter(|_| schema.has(Column::PublishTime)),
            journal: active(&criteria.journal, Column::Journal),
            source: active(&criteria.source, Column::Source),
            require_abstract: criteria.require_abstract && schema.has(Column::Abstract),
        }
    }

    fn matches(&self, row: &CleanedPaper) -> bool {
        if let Some((lo, hi)) = self.year_range {
            match row.publication_year {
                Some(y) if (lo..=hi).contains(&y) => {}
                _ => return false,
            }
        }
        if let Some(sel) = self.journal {
            if !sel.matches(row.journal()) {
                return false;
            }
        }
        if let Some(sel) = self.source {
            if !sel.matches(row.source()) {
                return false;
            }
        }
        !self.require_abstract || row.has_abstract
    }
}

/// Return indices of papers that pass all active criteria, in table order.
pub fn filtered_indices(table: &CleanedTable, criteria: &FilterCriteria) -> Result<Vec<usize>> {
    criteria.validate()?;
    let predicate = Predicate::new(table, criteria);
    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate.matches(row))
        .map(|(i, _)| i)
        .collect())
}

/// Apply `criteria` and return an independent copy of the matching rows.
pub fn apply_filters(table: &CleanedTable, criteria: &FilterCriteria) -> Result<CleanedTable> {
    let indices = filtered_indices(table, criteria)?;
    Ok(table.select(&indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::clean;
    use crate::data::loader::read_csv;
    use crate::data::synth::synthesize;

    fn papers() -> CleanedTable {
        clean(
            &read_csv(
                "cord_uid,title,abstract,journal,publish_time,source_x\n\
                 a,T1,x,Cell,2019-12-05,PMC\n\
                 b,T2,,Lancet,2020-02-01,WHO\n\
                 c,T3,y,Cell,2020-03-10,PMC\n\
                 d,T4,z,,,Medline\n\
                 e,T5,,Lancet,2021-07-07,WHO\n"
                    .as_bytes(),
            )
            .unwrap(),
        )
        .table
    }

    fn ids(t: &CleanedTable) -> Vec<&str> {
        t.rows
            .iter()
            .filter_map(|r| r.paper.cord_uid.as_deref())
            .collect()
    }

    #[test]
    fn test_all_is_identity() {
        let t = papers();
        let criteria = FilterCriteria {
            journal: Selection::from("All"),
            ..Default::default()
        };
        assert!(criteria.is_noop());
        assert_eq!(apply_filters(&t, &criteria).unwrap(), t);
    }

    #[test]
    fn test_year_range_excludes_undated() {
        let t = papers();
        let criteria = FilterCriteria {
            year_range: Some((2020, 2020)),
            ..Default::default()
        };
        let view = apply_filters(&t, &criteria).unwrap();
        assert_eq!(ids(&view), vec!["b", "c"]);
        assert!(view.rows.iter().all(|r| r.publication_year == Some(2020)));
    }

    #[test]
    fn test_criteria_compose_with_and() {
        let t = papers();
        let criteria = FilterCriteria {
            year_range: Some((2019, 2021)),
            journal: Selection::from("Cell"),
            source: Selection::from("PMC"),
            require_abstract: true,
        };
        assert_eq!(ids(&apply_filters(&t, &criteria).unwrap()), vec!["a", "c"]);

        let criteria = FilterCriteria {
            source: Selection::from("WHO"),
            require_abstract: true,
            ..Default::default()
        };
        assert!(apply_filters(&t, &criteria).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let criteria = FilterCriteria {
            year_range: Some((2022, 2020)),
            ..Default::default()
        };
        let err = apply_filters(&papers(), &criteria).unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidCriteria(_)));
        assert!(err.to_string().contains("2022 > 2020"));
    }

    #[test]
    fn test_filter_does_not_touch_input() {
        let t = clean(&synthesize(42, 300)).table;
        let before = t.clone();
        let criteria = FilterCriteria {
            year_range: Some((2021, 2022)),
            require_abstract: true,
            ..Default::default()
        };
        let view = apply_filters(&t, &criteria).unwrap();
        assert_eq!(t, before);
        assert!(view.len() < t.len());
    }

    #[test]
    fn test_criteria_on_absent_columns_are_skipped() {
        let t = clean(&read_csv("cord_uid,title\na,T1\nb,T2\n".as_bytes()).unwrap()).table;
        let criteria = FilterCriteria {
            journal: Selection::from("Cell"),
            require_abstract: true,
            ..Default::default()
        };
        assert_eq!(apply_filters(&t, &criteria).unwrap().len(), 2);
    }
}
