//! Chart sink for the batch analysis: labelled numeric series, written as JSON
//! for whatever renderer draws the figures.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::aggregate::{
    abstract_lengths, counts_by_year, histogram, monthly_trend, source_distribution,
    title_word_frequency, top_journals, DEFAULT_STOPWORDS,
};
use crate::data::model::CleanedTable;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Pie,
    Line,
    Histogram,
}

/// One figure: category labels and their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    fn new(id: &str, title: &str, kind: ChartKind, x_label: &str, y_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            labels: Vec::new(),
            values: Vec::new(),
        }
    }

    fn with_points<I, L>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (L, f64)>,
        L: ToString,
    {
        for (label, value) in points {
            self.labels.push(label.to_string());
            self.values.push(value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Knobs for [`overview_charts`].
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub top_journals: usize,
    pub top_words: usize,
    pub trend_years: BTreeSet<i32>,
    pub histogram_bins: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            top_journals: 10,
            top_words: 10,
            trend_years: [2020, 2021].into_iter().collect(),
            histogram_bins: 30,
        }
    }
}

/// The six overview figures of the analysis run.
pub fn overview_charts(table: &CleanedTable, options: &ChartOptions) -> Vec<ChartSeries> {
    let by_year = ChartSeries::new(
        "publications_by_year",
        "COVID-19 Research Publications by Year",
        ChartKind::Bar,
        "Publication Year",
        "Number of Papers",
    )
    .with_points(counts_by_year(table).into_iter().map(|(y, c)| (y, c as f64)));

    let journals = ChartSeries::new(
        "top_journals",
        &format!("Top {} Journals Publishing COVID-19 Research", options.top_journals),
        ChartKind::HorizontalBar,
        "Number of Papers",
        "Journal",
    )
    .with_points(
        top_journals(table, options.top_journals)
            .into_iter()
            .map(|(j, c)| (j, c as f64)),
    );

    let sources = ChartSeries::new(
        "sources",
        "Distribution of Research Sources",
        ChartKind::Pie,
        "Source",
        "Papers",
    )
    .with_points(
        source_distribution(table)
            .into_iter()
            .map(|(s, c)| (s, c as f64)),
    );

    let lengths = ChartSeries::new(
        "abstract_lengths",
        "Distribution of Abstract Lengths",
        ChartKind::Histogram,
        "Abstract Length (characters)",
        "Number of Papers",
    )
    .with_points(
        histogram(&abstract_lengths(table), options.histogram_bins)
            .into_iter()
            .map(|b| (format!("{:.0}-{:.0}", b.start, b.end), b.count as f64)),
    );

    let years: Vec<String> = options.trend_years.iter().map(i32::to_string).collect();
    let monthly = ChartSeries::new(
        "monthly_trend",
        &format!("Monthly Publications ({})", years.join(", ")),
        ChartKind::Line,
        "Month",
        "Number of Papers",
    )
    .with_points(
        monthly_trend(table, &options.trend_years)
            .into_iter()
            .map(|((y, m), c)| (format!("{y}-{m:02}"), c as f64)),
    );

    let words = ChartSeries::new(
        "title_words",
        "Most Frequent Words in Titles",
        ChartKind::HorizontalBar,
        "Frequency",
        "Word",
    )
    .with_points(
        title_word_frequency(table, &DEFAULT_STOPWORDS)
            .into_iter()
            .take(options.top_words)
            .map(|(w, c)| (w, c as f64)),
    );

    vec![by_year, journals, sources, lengths, monthly, words]
}

/// Write the series as pretty JSON.
pub fn write_charts(path: &Path, charts: &[ChartSeries]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, charts)?;
    log::info!("Wrote {} chart series to {}", charts.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::clean::clean;
    use crate::data::synth::synthesize;

    #[test]
    fn test_overview_charts_shapes() {
        let table = clean(&synthesize(42, 500)).table;
        let charts = overview_charts(&table, &ChartOptions::default());
        assert_eq!(charts.len(), 6);
        for c in &charts {
            assert_eq!(c.labels.len(), c.values.len(), "{}", c.id);
            assert!(!c.is_empty(), "{}", c.id);
        }
        assert!(charts[1].labels.len() <= 10);
        assert!(charts[4].labels.iter().all(|l| l.starts_with("2020") || l.starts_with("2021")));

        let year_total: f64 = charts[0].values.iter().sum();
        let dated = table.rows.iter().filter(|r| r.publication_year.is_some()).count();
        assert_eq!(year_total as usize, dated);
    }

    #[test]
    fn test_write_charts_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.json");
        let charts = overview_charts(&clean(&synthesize(3, 40)).table, &ChartOptions::default());
        write_charts(&path, &charts).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Vec<ChartSeries> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, charts);
    }
}
