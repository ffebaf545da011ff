use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cord_explorer::cache::SnapshotCache;
use cord_explorer::config::DashboardConfig;
use cord_explorer::data::aggregate::{
    abstract_length_stats, abstract_lengths, counts_by_year, dataset_summary, histogram,
    journal_diversity, monthly_trend, source_by_year, source_distribution,
    title_word_count_stats, top_journals, DatasetSummary, HistogramBin, JournalDiversity,
    SummaryStats, TitleWordStats,
};
use cord_explorer::data::clean::{clean, MissingReport};
use cord_explorer::data::filter::{apply_filters, FilterCriteria, Selection};
use cord_explorer::data::loader::{load_file, DataOrigin};
use cord_explorer::data::model::{CleanedTable, Column};
use cord_explorer::data::synth::synthesize;
use cord_explorer::Result;

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Dashboard view: filtered table plus every aggregate the panels draw
// ---------------------------------------------------------------------------

/// Central panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Timeline,
    Journals,
    Sources,
    Content,
    Data,
}

/// Aggregates of the current filtered view. Rebuilt on every filter change, never patched.
pub struct DashboardView {
    pub table: CleanedTable,
    pub summary: DatasetSummary,
    pub by_year: BTreeMap<i32, usize>,
    pub monthly: BTreeMap<(i32, u32), usize>,
    pub top_journals: Vec<(String, usize)>,
    pub diversity: Option<JournalDiversity>,
    pub sources: Vec<(String, usize)>,
    pub source_by_year: BTreeMap<String, BTreeMap<i32, usize>>,
    pub abstract_stats: Option<SummaryStats>,
    pub abstract_histogram: Vec<HistogramBin>,
    pub title_stats: Option<TitleWordStats>,
    pub missing: MissingReport,
}

impl DashboardView {
    fn compute(table: CleanedTable, config: &DashboardConfig) -> Self {
        let by_year = counts_by_year(&table);
        let years: BTreeSet<i32> = by_year.keys().copied().collect();
        DashboardView {
            summary: dataset_summary(&table),
            monthly: monthly_trend(&table, &years),
            top_journals: top_journals(&table, config.top_journals),
            diversity: journal_diversity(&table, 5),
            sources: source_distribution(&table),
            source_by_year: source_by_year(&table),
            abstract_stats: abstract_length_stats(&table),
            abstract_histogram: histogram(&abstract_lengths(&table), config.histogram_bins),
            title_stats: title_word_count_stats(&table),
            missing: MissingReport::for_cleaned(&table),
            by_year,
            table,
        }
    }

    /// Share of visible papers with an abstract, in percent. `None` for an empty view.
    pub fn abstract_coverage(&self) -> Option<f64> {
        let total = self.summary.total_papers;
        (total > 0).then(|| self.summary.papers_with_abstracts as f64 / total as f64 * 100.0)
    }

    /// One-line findings for the insights panel; aggregates with no data are left out.
    pub fn key_insights(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some((year, count)) = self
            .by_year
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        {
            lines.push(format!("Peak publication year: {year} ({count} papers)"));
        }
        if let Some((journal, count)) = self.top_journals.first() {
            lines.push(format!("Most active journal: {journal} ({count} papers)"));
        }
        if let Some((source, count)) = self.sources.first() {
            lines.push(format!("Primary source: {source} ({count} papers)"));
        }
        if let Some(coverage) = self.abstract_coverage() {
            lines.push(format!("Abstract coverage: {coverage:.1}%"));
        }
        if let Some(t) = &self.title_stats {
            lines.push(format!("Average title length: {:.1} words", t.summary.mean));
        }
        lines
    }
}

/// Choices offered by the filter widgets, taken from the full dataset.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub years: Option<(i32, i32)>,
    pub journals: Vec<String>,
    pub sources: Vec<String>,
    /// Which filter widgets apply; a column missing from the schema hides its widget.
    pub has_dates: bool,
    pub has_journals: bool,
    pub has_sources: bool,
    pub has_abstracts: bool,
}

impl FilterOptions {
    fn from_table(table: &CleanedTable) -> Self {
        let years = counts_by_year(table);
        let sorted_unique = |values: Vec<&str>| -> Vec<String> {
            let set: BTreeSet<&str> = values.into_iter().collect();
            set.into_iter().map(str::to_string).collect()
        };
        FilterOptions {
            years: years
                .keys()
                .next()
                .zip(years.keys().next_back())
                .map(|(lo, hi)| (*lo, *hi)),
            journals: sorted_unique(table.rows.iter().filter_map(|r| r.journal()).collect()),
            sources: sorted_unique(table.rows.iter().filter_map(|r| r.source()).collect()),
            has_dates: table.schema.has(Column::PublishTime),
            has_journals: table.schema.has(Column::Journal),
            has_sources: table.schema.has(Column::Source),
            has_abstracts: table.schema.has(Column::Abstract),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Snapshot path currently shown.
    pub snapshot_path: PathBuf,

    cache: SnapshotCache,

    /// Full dataset (None until something loads).
    pub dataset: Option<Arc<CleanedTable>>,

    /// Where the dataset came from, for the status bar.
    pub origin: String,
    pub synthesized: bool,

    pub options: FilterOptions,

    /// Year slider positions. The year criterion is only set while they are
    /// narrower than the full range, so undated papers show by default.
    pub year_slider: (i32, i32),

    pub criteria: FilterCriteria,

    /// Filtered view and its aggregates (cached until the next filter change).
    pub view: Option<DashboardView>,

    /// Source colours, stable across filter changes.
    pub color_map: ColorMap,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            snapshot_path: config.snapshot.clone(),
            config,
            cache: SnapshotCache::new(),
            dataset: None,
            origin: String::new(),
            synthesized: false,
            options: FilterOptions::default(),
            year_slider: (0, 0),
            criteria: FilterCriteria::default(),
            view: None,
            color_map: ColorMap::default(),
            tab: Tab::default(),
            status_message: None,
        }
    }

    /// Load `path`, falling back to a synthetic sample as the config allows.
    ///
    /// `.csv` snapshots go through the content-hash cache; other formats are
    /// raw metadata and are cleaned on load.
    pub fn open(&mut self, path: &Path) {
        self.snapshot_path = path.to_path_buf();
        match self.read(path) {
            Ok(table) => {
                self.set_dataset(table, DataOrigin::File(path.to_path_buf()));
            }
            Err(err) if self.config.fallback.covers(&err) => {
                log::warn!("{err}; showing a synthetic sample");
                let options = self.config.load_options();
                let table = clean(&synthesize(options.seed, options.sample_size)).table;
                self.set_dataset(Arc::new(table), DataOrigin::Synthesized { cause: err });
            }
            Err(err) => {
                log::error!("Failed to load {}: {err}", path.display());
                self.status_message = Some(format!("Error: {err}"));
            }
        }
    }

    fn read(&mut self, path: &Path) -> Result<Arc<CleanedTable>> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            self.cache.load(path)
        } else {
            Ok(Arc::new(clean(&load_file(path)?).table))
        }
    }

    /// Drop the cached snapshot and read the file again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        let path = self.snapshot_path.clone();
        self.open(&path);
    }

    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: Arc<CleanedTable>, origin: DataOrigin) {
        let unchanged = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));

        self.synthesized = origin.is_synthesized();
        self.origin = origin.describe();
        self.status_message = None;
        if unchanged {
            log::debug!("Dataset unchanged; keeping filters");
            return;
        }

        log::info!("Dashboard showing {} papers ({})", dataset.len(), self.origin);
        self.options = FilterOptions::from_table(&dataset);
        self.year_slider = self.options.years.unwrap_or((0, 0));
        self.criteria = FilterCriteria::default();
        self.color_map = ColorMap::new(self.options.sources.iter().map(String::as_str));
        self.dataset = Some(dataset);
        self.refilter();
    }

    /// Recompute the filtered view and its aggregates after a filter change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match apply_filters(ds, &self.criteria) {
            Ok(table) => {
                log::debug!("{} of {} papers pass the filters", table.len(), ds.len());
                self.view = Some(DashboardView::compute(table, &self.config));
                self.status_message = None;
            }
            Err(err) => {
                self.status_message = Some(err.to_string());
            }
        }
    }

    /// Move the year slider; the criterion is cleared when it spans everything.
    pub fn set_year_range(&mut self, lo: i32, hi: i32) {
        self.year_slider = (lo, hi);
        self.criteria.year_range = match self.options.years {
            Some(full) if full == (lo, hi) => None,
            _ => Some((lo, hi)),
        };
        self.refilter();
    }

    pub fn set_journal(&mut self, journal: Selection) {
        self.criteria.journal = journal;
        self.refilter();
    }

    pub fn set_source(&mut self, source: Selection) {
        self.criteria.source = source;
        self.refilter();
    }

    pub fn set_require_abstract(&mut self, required: bool) {
        self.criteria.require_abstract = required;
        self.refilter();
    }

    /// Whether any filter narrows the view.
    pub fn filters_active(&self) -> bool {
        !self.criteria.is_noop()
    }

    pub fn reset_filters(&mut self) {
        if !self.filters_active() {
            return;
        }
        self.criteria = FilterCriteria::default();
        self.year_slider = self.options.years.unwrap_or((0, 0));
        self.refilter();
    }

    pub fn visible_count(&self) -> usize {
        self.view.as_ref().map_or(0, |v| v.table.len())
    }

    pub fn total_count(&self) -> usize {
        self.dataset.as_ref().map_or(0, |d| d.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cord_explorer::data::snapshot::write_snapshot;

    fn small_config() -> DashboardConfig {
        DashboardConfig {
            sample_size: 300,
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn test_missing_snapshot_shows_synthetic_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(small_config());
        state.open(&dir.path().join("cord19_cleaned_data.csv"));

        assert!(state.synthesized);
        assert!(state.total_count() > 0);
        assert_eq!(state.visible_count(), state.total_count());
        assert!(state.origin.contains("not found"));
    }

    #[test]
    fn test_filters_update_view() {
        let mut state = AppState::new(small_config());
        let table = clean(&synthesize(42, 300)).table;
        state.set_dataset(Arc::new(table), DataOrigin::File(PathBuf::from("x.csv")));
        let total = state.total_count();

        state.set_year_range(2020, 2020);
        let view = state.view.as_ref().unwrap();
        assert!(view.table.len() < total);
        assert_eq!(view.by_year.keys().copied().collect::<Vec<_>>(), vec![2020]);

        state.set_require_abstract(true);
        assert!(state.view.as_ref().unwrap().table.rows.iter().all(|r| r.has_abstract));

        assert!(state.filters_active());
        state.reset_filters();
        assert!(!state.filters_active());
        assert_eq!(state.year_slider, state.options.years.unwrap());
        assert_eq!(state.visible_count(), total);
    }

    #[test]
    fn test_inverted_slider_reports_error_and_keeps_view() {
        let mut state = AppState::new(small_config());
        let table = clean(&synthesize(42, 100)).table;
        state.set_dataset(Arc::new(table), DataOrigin::File(PathBuf::from("x.csv")));
        let before = state.visible_count();

        state.set_year_range(2022, 2020);
        assert!(state.status_message.as_deref().unwrap().contains("inverted"));
        assert_eq!(state.visible_count(), before);
    }

    #[test]
    fn test_reopening_same_file_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&clean(&synthesize(42, 80)).table, &path).unwrap();

        let mut state = AppState::new(small_config());
        state.open(&path);
        assert!(!state.synthesized);
        state.set_source(Selection::from("PMC"));
        let filtered = state.visible_count();

        state.open(&path);
        assert_eq!(state.visible_count(), filtered);
        assert_eq!(state.cache.hits(), 1);

        state.reload();
        assert_eq!(state.cache.misses(), 2);
        assert_eq!(state.visible_count(), state.total_count());
    }

    #[test]
    fn test_key_insights_and_coverage() {
        let raw = cord_explorer::data::loader::read_csv(
            "cord_uid,title,abstract,journal,publish_time,source_x\n\
             a,Vaccine trial,Text,Cell,2020-03-01,PMC\n\
             b,Mask study,,Cell,2020-05-01,WHO\n\
             c,Long covid,Text,Nature,2021-01-01,PMC\n\
             d,Treatment,,,2021-02-01,PMC\n"
                .as_bytes(),
        )
        .unwrap();
        let view = DashboardView::compute(clean(&raw).table, &DashboardConfig::default());

        assert_eq!(view.abstract_coverage(), Some(50.0));
        let insights = view.key_insights();
        assert!(insights.contains(&"Peak publication year: 2020 (2 papers)".to_string()));
        assert!(insights.contains(&"Most active journal: Cell (2 papers)".to_string()));
        assert!(insights.contains(&"Primary source: PMC (3 papers)".to_string()));
        assert!(insights.contains(&"Abstract coverage: 50.0%".to_string()));

        let empty = DashboardView::compute(CleanedTable::default(), &DashboardConfig::default());
        assert_eq!(empty.abstract_coverage(), None);
        assert!(empty.key_insights().is_empty());
    }
}
