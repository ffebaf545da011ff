//! Human-readable console sections for the analysis run. Not a machine-readable contract.

use std::collections::BTreeSet;

use crate::data::aggregate::{
    abstract_length_stats, counts_by_year, dataset_summary, monthly_trend, source_distribution,
    title_word_count_stats, title_word_frequency, top_journals, DatasetSummary, YearStats,
    DEFAULT_STOPWORDS,
};
use crate::data::clean::{Cleaned, MissingReport};
use crate::data::loader::DataOrigin;
use crate::data::model::{CleanedTable, Column, PaperTable};

const RULE_WIDTH: usize = 60;

/// Section heading followed by a rule.
pub fn heading(title: &str) -> String {
    format!("\n{title}\n{}", "=".repeat(RULE_WIDTH))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Shape, origin, columns and the first few rows of the raw table.
pub fn overview(table: &PaperTable, origin: &DataOrigin, head: usize) -> String {
    let columns: Vec<&str> = table.schema.fields().iter().map(|f| f.name()).collect();
    let mut lines = vec![
        format!("Source: {}", origin.describe()),
        format!(
            "Dataset dimensions: {} rows x {} columns",
            table.len(),
            table.schema.len()
        ),
        format!("Columns: {}", columns.join(", ")),
        format!("First {} rows:", head.min(table.len())),
    ];
    for paper in table.rows.iter().take(head) {
        lines.push(format!(
            "  {:<12} {}",
            paper.get(Column::CordUid).unwrap_or("-"),
            truncate(paper.get(Column::Title).unwrap_or("-"), 70)
        ));
    }
    lines.join("\n")
}

pub fn missing_values(report: &MissingReport) -> String {
    if report.is_empty() {
        return "No missing values found.".to_string();
    }
    let mut lines = vec![format!("{:<24} {:>8} {:>9}", "Column", "Missing", "Percent")];
    for e in &report.entries {
        lines.push(format!("{:<24} {:>8} {:>8.1}%", e.column, e.count, e.percentage));
    }
    lines.join("\n")
}

pub fn cleaning_summary(raw: &PaperTable, cleaned: &Cleaned) -> String {
    let derived: Vec<&str> = cleaned.table.derived.iter().map(|d| d.header()).collect();
    [
        format!("Original rows: {}", raw.len()),
        format!("Cleaned rows: {}", cleaned.table.len()),
        format!("Duplicate titles removed: {}", cleaned.duplicates_removed),
        format!("Unparseable dates: {}", cleaned.unparsed_dates),
        format!("Derived columns: {}", derived.join(", ")),
    ]
    .join("\n")
}

/// Findings of the six overview analyses.
pub fn highlights(table: &CleanedTable, trend_years: &BTreeSet<i32>, top_words: usize) -> String {
    let mut lines = Vec::new();

    let years = counts_by_year(table);
    match years.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0))) {
        Some((year, count)) => {
            lines.push(format!("Peak year: {year} ({count} papers)"));
            lines.push(format!("Years covered: {}", years.len()));
        }
        None => lines.push("Publication years: no data".to_string()),
    }

    match top_journals(table, 1).first() {
        Some((journal, count)) => lines.push(format!("Top journal: {journal} ({count} papers)")),
        None => lines.push("Journals: no data".to_string()),
    }

    let sources = source_distribution(table);
    match sources.first() {
        Some((source, count)) => lines.push(format!(
            "Primary source: {source} ({count} papers, {} sources total)",
            sources.len()
        )),
        None => lines.push("Sources: no data".to_string()),
    }

    match abstract_length_stats(table) {
        Some(s) => lines.push(format!(
            "Abstract length: mean {:.0}, median {:.0}, range {:.0}-{:.0} characters ({} abstracts)",
            s.mean, s.median, s.min, s.max, s.count
        )),
        None => lines.push("Abstract length: no data".to_string()),
    }

    let trend = monthly_trend(table, trend_years);
    match trend.iter().max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0))) {
        Some(((y, m), count)) => lines.push(format!("Peak month: {y}-{m:02} ({count} papers)")),
        None => lines.push("Monthly trend: no data".to_string()),
    }

    let words = title_word_frequency(table, &DEFAULT_STOPWORDS);
    match words.first() {
        Some((word, count)) => {
            lines.push(format!(
                "Most common title word: '{word}' ({count} occurrences, {} unique words)",
                words.len()
            ));
            let top: Vec<String> = words
                .iter()
                .take(top_words)
                .map(|(w, c)| format!("{w} ({c})"))
                .collect();
            lines.push(format!("Top title words: {}", top.join(", ")));
        }
        None => lines.push("Title words: no data".to_string()),
    }

    if let Some(t) = title_word_count_stats(table) {
        lines.push(format!(
            "Title length: mean {:.1} words, range {:.0}-{:.0}",
            t.summary.mean, t.summary.min, t.summary.max
        ));
    }

    lines.join("\n")
}

pub fn yearly_table(stats: &[YearStats]) -> String {
    let mut lines = vec![format!(
        "{:<6} {:>8} {:>14} {:>20}",
        "Year", "Papers", "With abstract", "Avg abstract length"
    )];
    for s in stats {
        let avg = s
            .mean_abstract_length
            .map(|m| format!("{m:.2}"))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{:<6} {:>8} {:>14} {:>20}",
            s.year, s.papers, s.with_abstract, avg
        ));
    }
    lines.join("\n")
}

pub fn final_summary(summary: &DatasetSummary) -> String {
    let range = summary
        .year_range
        .map(|(lo, hi)| format!("{lo}-{hi}"))
        .unwrap_or_else(|| "Unknown".to_string());
    let avg = summary
        .mean_abstract_length
        .map(|m| format!("{m:.1}"))
        .unwrap_or_else(|| "no data".to_string());
    [
        format!("Total papers: {}", summary.total_papers),
        format!("Date range: {range}"),
        format!("Unique journals: {}", summary.unique_journals),
        format!("Unique sources: {}", summary.unique_sources),
        format!("Papers with abstracts: {}", summary.papers_with_abstracts),
        format!("Avg abstract length: {avg}"),
    ]
    .join("\n")
}

/// Convenience: [`final_summary`] straight from a table.
pub fn table_summary(table: &CleanedTable) -> String {
    final_summary(&dataset_summary(table))
}
