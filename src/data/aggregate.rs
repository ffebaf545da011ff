//! Grouped counts and descriptive statistics over a (possibly filtered) cleaned table.
//!
//! Every function here is pure: it borrows the table, never mutates it, and
//! is recomputed on demand. Nothing is cached.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::model::CleanedTable;

lazy_static! {
    // Word tokens for title frequency counts.
    static ref WORD_PATTERN: Regex = Regex::new(r"\w+").expect("word pattern compiles");
}

/// Stopwords removed from title word counts.
pub const DEFAULT_STOPWORDS: [&str; 24] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "have", "has", "had",
];

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Number of papers per publication year, ascending by year. Undated papers are not counted.
pub fn counts_by_year(table: &CleanedTable) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for year in table.rows.iter().filter_map(|r| r.publication_year) {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

/// Count occurrences, most frequent first. Ties keep first-encountered order.
pub fn value_counts<'a, I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match position.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(v, counts.len());
                counts.push((v, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
}

/// The `k` journals with the most papers.
pub fn top_journals(table: &CleanedTable, k: usize) -> Vec<(String, usize)> {
    let mut counts = value_counts(table.rows.iter().filter_map(|r| r.journal()));
    counts.truncate(k);
    counts
}

/// Papers per source tag, most frequent first.
pub fn source_distribution(table: &CleanedTable) -> Vec<(String, usize)> {
    value_counts(table.rows.iter().filter_map(|r| r.source()))
}

/// Papers per (year, month), chronological, for the given years only.
pub fn monthly_trend(table: &CleanedTable, years: &BTreeSet<i32>) -> BTreeMap<(i32, u32), usize> {
    let mut counts = BTreeMap::new();
    for row in &table.rows {
        if let (Some(y), Some(m)) = (row.publication_year, row.publication_month) {
            if years.contains(&y) {
                *counts.entry((y, m)).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Per-source yearly counts: source → (year → papers).
pub fn source_by_year(table: &CleanedTable) -> BTreeMap<String, BTreeMap<i32, usize>> {
    let mut out: BTreeMap<String, BTreeMap<i32, usize>> = BTreeMap::new();
    for row in &table.rows {
        if let (Some(source), Some(year)) = (row.source(), row.publication_year) {
            *out.entry(source.to_string())
                .or_default()
                .entry(year)
                .or_insert(0) += 1;
        }
    }
    out
}

/// Title word frequencies, most frequent first.
///
/// Titles are lower-cased and split into `\w+` tokens; tokens of two
/// characters or fewer and stopwords are dropped. Ties keep the order in
/// which words were first seen.
pub fn title_word_frequency(table: &CleanedTable, stopwords: &[&str]) -> Vec<(String, usize)> {
    let stop: HashSet<&str> = stopwords.iter().copied().collect();
    let lowered: Vec<String> = table
        .rows
        .iter()
        .filter_map(|r| r.title())
        .map(str::to_lowercase)
        .collect();

    value_counts(
        lowered
            .iter()
            .flat_map(|t| WORD_PATTERN.find_iter(t))
            .map(|m| m.as_str())
            .filter(|w| w.chars().count() > 2 && !stop.contains(w)),
    )
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Summary of a numeric column over its present values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Describe `values`. `None` when there is nothing to describe.
pub fn describe(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    Some(SummaryStats {
        count,
        mean: sorted.iter().sum::<f64>() / count as f64,
        median: quantile(&sorted, 0.5),
        min: sorted[0],
        max: sorted[count - 1],
    })
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Abstract length statistics. `None` means no paper in the table has an abstract.
pub fn abstract_length_stats(table: &CleanedTable) -> Option<SummaryStats> {
    describe(&abstract_lengths(table))
}

/// Present abstract lengths, in row order.
pub fn abstract_lengths(table: &CleanedTable) -> Vec<f64> {
    table
        .rows
        .iter()
        .filter_map(|r| r.abstract_length)
        .map(|n| n as f64)
        .collect()
}

/// Title word-count distribution, with what a box plot needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TitleWordStats {
    pub summary: SummaryStats,
    pub q1: f64,
    pub q3: f64,
    /// Most common word count; the smallest wins a tie.
    pub mode: usize,
}

pub fn title_word_count_stats(table: &CleanedTable) -> Option<TitleWordStats> {
    let counts: Vec<usize> = table.rows.iter().filter_map(|r| r.title_word_count).collect();
    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    let summary = describe(&values)?;

    let mut sorted = values;
    sorted.sort_by(f64::total_cmp);

    let mut freq: BTreeMap<usize, usize> = BTreeMap::new();
    for c in counts {
        *freq.entry(c).or_insert(0) += 1;
    }
    let best = freq.values().copied().max().unwrap_or(0);
    let mode = freq
        .iter()
        .find(|(_, &n)| n == best)
        .map(|(&c, _)| c)
        .unwrap_or(0);

    Some(TitleWordStats {
        summary,
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
        mode,
    })
}

/// One equal-width histogram bucket `[start, end)`; the last bucket is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over the value range.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some(stats) = describe(values) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let span = stats.max - stats.min;
    if span == 0.0 {
        return vec![HistogramBin {
            start: stats.min,
            end: stats.max,
            count: values.len(),
        }];
    }

    let width = span / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: stats.min + width * i as f64,
            end: stats.min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - stats.min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Grouped summaries
// ---------------------------------------------------------------------------

/// Per-year paper counts and abstract coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearStats {
    pub year: i32,
    /// Dated papers with a title; untitled rows still open their year's group.
    pub papers: usize,
    pub with_abstract: usize,
    pub mean_abstract_length: Option<f64>,
}

pub fn yearly_stats(table: &CleanedTable) -> Vec<YearStats> {
    let mut groups: BTreeMap<i32, (usize, usize, Vec<f64>)> = BTreeMap::new();
    for row in &table.rows {
        let Some(year) = row.publication_year else {
            continue;
        };
        let entry = groups.entry(year).or_default();
        if row.title().is_some() {
            entry.0 += 1;
        }
        if row.has_abstract {
            entry.1 += 1;
        }
        if let Some(len) = row.abstract_length {
            entry.2.push(len as f64);
        }
    }
    groups
        .into_iter()
        .map(|(year, (papers, with_abstract, lengths))| YearStats {
            year,
            papers,
            with_abstract,
            mean_abstract_length: describe(&lengths).map(|s| s.mean),
        })
        .collect()
}

/// How concentrated publication is in the largest journals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JournalDiversity {
    /// Papers that name a journal.
    pub journal_papers: usize,
    pub unique_journals: usize,
    /// Percentage of journal papers in the top journals.
    pub top_share: f64,
    /// Percentage of journal papers elsewhere.
    pub other_share: f64,
}

/// `None` when no paper names a journal.
pub fn journal_diversity(table: &CleanedTable, top_n: usize) -> Option<JournalDiversity> {
    let counts = value_counts(table.rows.iter().filter_map(|r| r.journal()));
    let journal_papers: usize = counts.iter().map(|(_, c)| c).sum();
    if journal_papers == 0 {
        return None;
    }
    let top: usize = counts.iter().take(top_n).map(|(_, c)| c).sum();
    let total = journal_papers as f64;
    Some(JournalDiversity {
        journal_papers,
        unique_journals: counts.len(),
        top_share: top as f64 / total * 100.0,
        other_share: (journal_papers - top) as f64 / total * 100.0,
    })
}

/// Headline numbers for the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_papers: usize,
    pub year_range: Option<(i32, i32)>,
    pub unique_journals: usize,
    pub unique_sources: usize,
    pub papers_with_abstracts: usize,
    pub mean_abstract_length: Option<f64>,
}

pub fn dataset_summary(table: &CleanedTable) -> DatasetSummary {
    let years = counts_by_year(table);
    let year_range = match (years.keys().next(), years.keys().next_back()) {
        (Some(&lo), Some(&hi)) => Some((lo, hi)),
        _ => None,
    };
    let journals: HashSet<&str> = table.rows.iter().filter_map(|r| r.journal()).collect();
    let sources: HashSet<&str> = table.rows.iter().filter_map(|r| r.source()).collect();

    DatasetSummary {
        total_papers: table.len(),
        year_range,
        unique_journals: journals.len(),
        unique_sources: sources.len(),
        papers_with_abstracts: table.rows.iter().filter(|r| r.has_abstract).count(),
        mean_abstract_length: abstract_length_stats(table).map(|s| s.mean),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::clean;
    use crate::data::loader::read_csv;

    fn cleaned(csv: &str) -> CleanedTable {
        clean(&read_csv(csv.as_bytes()).unwrap()).table
    }

    fn five_papers() -> CleanedTable {
        cleaned(
            "cord_uid,title,abstract,journal,publish_time,source_x\n\
             a,T1,abcd,Cell,2019-12-05,PMC\n\
             b,T2,,Lancet,2020-02-01,WHO\n\
             c,T3,abcdefgh,Cell,2020-03-10,PMC\n\
             d,T4,ab,,2021-01-20,Medline\n\
             e,T5,,Lancet,2021-07-07,WHO\n",
        )
    }

    #[test]
    fn test_counts_by_year_ascending() {
        let counts = counts_by_year(&five_papers());
        let pairs: Vec<(i32, usize)> = counts.into_iter().collect();
        assert_eq!(pairs, vec![(2019, 1), (2020, 2), (2021, 2)]);
    }

    #[test]
    fn test_top_journals_ties_by_first_seen() {
        let top = top_journals(&five_papers(), 5);
        assert_eq!(top, vec![("Cell".to_string(), 2), ("Lancet".to_string(), 2)]);
        assert_eq!(top_journals(&five_papers(), 1).len(), 1);
    }

    #[test]
    fn test_source_distribution() {
        let dist = source_distribution(&five_papers());
        assert_eq!(
            dist,
            vec![
                ("PMC".to_string(), 2),
                ("WHO".to_string(), 2),
                ("Medline".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_abstract_stats() {
        let stats = abstract_length_stats(&five_papers()).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 14.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 8.0);
    }

    #[test]
    fn test_abstract_stats_without_abstracts_is_none() {
        let t = cleaned("cord_uid,title,abstract\na,T1,\nb,T2,\n");
        assert_eq!(abstract_length_stats(&t), None);
        assert_eq!(dataset_summary(&t).mean_abstract_length, None);
    }

    #[test]
    fn test_monthly_trend_restricted_and_ordered() {
        let years: BTreeSet<i32> = [2020, 2021].into_iter().collect();
        let trend: Vec<((i32, u32), usize)> =
            monthly_trend(&five_papers(), &years).into_iter().collect();
        assert_eq!(
            trend,
            vec![((2020, 2), 1), ((2020, 3), 1), ((2021, 1), 1), ((2021, 7), 1)]
        );
    }

    #[test]
    fn test_title_word_frequency() {
        let t = cleaned(
            "cord_uid,title\n\
             a,COVID-19 and vaccination\n\
             b,vaccination and treatment\n",
        );
        let freq = title_word_frequency(&t, &["and"]);
        assert_eq!(
            freq,
            vec![
                ("vaccination".to_string(), 2),
                ("covid".to_string(), 1),
                ("treatment".to_string(), 1)
            ]
        );
        assert!(freq.iter().all(|(w, _)| w.chars().count() > 2));
    }

    #[test]
    fn test_title_word_stats_mode_and_quartiles() {
        let t = cleaned("cord_uid,title\na,one two\nb,one two three\nc,x y\nd,a b c d e\n");
        let stats = title_word_count_stats(&t).unwrap();
        assert_eq!(stats.mode, 2);
        assert_eq!(stats.summary.min, 2.0);
        assert_eq!(stats.summary.max, 5.0);
        assert_eq!(stats.summary.median, 2.5);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 3.5);
    }

    #[test]
    fn test_histogram_covers_every_value() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 3);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[2].count, 1);
        assert!(histogram(&[], 10).is_empty());
        assert_eq!(histogram(&[5.0, 5.0], 10).len(), 1);
    }

    #[test]
    fn test_yearly_and_diversity() {
        let t = five_papers();
        let yearly = yearly_stats(&t);
        assert_eq!(yearly.len(), 3);
        assert_eq!(yearly[1].year, 2020);
        assert_eq!(yearly[1].papers, 2);
        assert_eq!(yearly[1].with_abstract, 1);
        assert_eq!(yearly[1].mean_abstract_length, Some(8.0));

        let div = journal_diversity(&t, 1).unwrap();
        assert_eq!(div.journal_papers, 4);
        assert_eq!(div.unique_journals, 2);
        assert!((div.top_share - 50.0).abs() < 1e-9);

        let by_source = source_by_year(&t);
        assert_eq!(by_source["PMC"].get(&2020), Some(&1));
    }

    #[test]
    fn test_yearly_papers_count_titled_rows() {
        let t = cleaned(
            "cord_uid,title,abstract,publish_time\n\
             a,Titled,abc,2020-01-01\n\
             b,Second,,2020-02-01\n\
             c,,abcd,2021-05-05\n",
        );
        let yearly = yearly_stats(&t);
        assert_eq!(yearly.len(), 2);
        assert_eq!((yearly[0].year, yearly[0].papers, yearly[0].with_abstract), (2020, 2, 1));
        assert_eq!((yearly[1].year, yearly[1].papers, yearly[1].with_abstract), (2021, 0, 1));
    }
}
