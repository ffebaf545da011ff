use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints};

use cord_explorer::data::model::{Column, DerivedColumn, Field};

use crate::color::ColorMap;
use crate::state::{AppState, DashboardView, Tab};

const TABS: [(Tab, &str); 5] = [
    (Tab::Timeline, "Timeline"),
    (Tab::Journals, "Journals"),
    (Tab::Sources, "Sources"),
    (Tab::Content, "Content"),
    (Tab::Data, "Data"),
];

const NO_DATA: &str = "No data for the current filters.";

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the metrics row and the selected chart tab.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a snapshot to explore papers  (File → Open…)");
        });
        return;
    };
    metrics_row(ui, view);
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        for (tab, label) in TABS {
            ui.selectable_value(&mut state.tab, tab, label);
        }
    });
    ui.separator();

    let Some(view) = &state.view else {
        return;
    };
    match state.tab {
        Tab::Timeline => timeline(ui, view),
        Tab::Journals => journals(ui, view),
        Tab::Sources => sources(ui, view, &state.color_map),
        Tab::Content => content(ui, view),
        Tab::Data => data(ui, view, state.config.sample_rows),
    }
}

fn metrics_row(ui: &mut Ui, view: &DashboardView) {
    let s = &view.summary;
    let range = s
        .year_range
        .map(|(lo, hi)| format!("{lo} – {hi}"))
        .unwrap_or_else(|| "Unknown".to_string());
    let abstracts = match view.abstract_coverage() {
        Some(pct) => format!("{} ({pct:.1}%)", s.papers_with_abstracts),
        None => s.papers_with_abstracts.to_string(),
    };
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Papers", s.total_papers.to_string());
        metric(ui, "Columns", view.table.headers().len().to_string());
        metric(ui, "Journals", s.unique_journals.to_string());
        metric(ui, "With abstracts", abstracts);
        metric(ui, "Date range", range);
    });

    let insights = view.key_insights();
    if !insights.is_empty() {
        egui::CollapsingHeader::new(RichText::new("Key insights").strong())
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for line in insights {
                    ui.label(format!("• {line}"));
                }
            });
    }
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(label).weak());
            ui.label(RichText::new(value).heading());
        });
    });
}

/// Half of the remaining height, for two stacked plots.
fn half_height(ui: &Ui) -> f32 {
    (ui.available_height() / 2.0 - 24.0).max(120.0)
}

/// Axis label for a categorical position; blank between categories.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn integer_label(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    if mark.value.fract().abs() > 1e-6 {
        String::new()
    } else {
        format!("{:.0}", mark.value)
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn timeline(ui: &mut Ui, view: &DashboardView) {
    if view.by_year.is_empty() {
        ui.label(NO_DATA);
        return;
    }
    let height = half_height(ui);

    ui.strong("Publications by year");
    let bars: Vec<Bar> = view
        .by_year
        .iter()
        .map(|(&year, &count)| Bar::new(year as f64, count as f64).width(0.6))
        .collect();
    Plot::new("papers_by_year")
        .height(height)
        .x_axis_label("Year")
        .y_axis_label("Papers")
        .x_axis_formatter(integer_label)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).name("Papers"));
        });

    ui.strong("Monthly publications");
    let points: PlotPoints = view
        .monthly
        .iter()
        .map(|(&(year, month), &count)| [year as f64 + (month - 1) as f64 / 12.0, count as f64])
        .collect();
    Plot::new("monthly_trend")
        .height(height)
        .x_axis_label("Year")
        .y_axis_label("Papers")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Papers per month").width(2.0));
        });
}

fn journals(ui: &mut Ui, view: &DashboardView) {
    if view.top_journals.is_empty() {
        ui.label(NO_DATA);
        return;
    }
    ui.strong(format!("Top {} journals", view.top_journals.len()));
    if let Some(d) = &view.diversity {
        ui.label(format!(
            "{} journals across {} papers; the top 5 hold {:.1}%, the rest {:.1}%",
            d.unique_journals, d.journal_papers, d.top_share, d.other_share
        ));
    }

    // Largest journal on top.
    let n = view.top_journals.len();
    let axis: Vec<String> = view.top_journals.iter().rev().map(|(j, _)| j.clone()).collect();
    let bars: Vec<Bar> = view
        .top_journals
        .iter()
        .enumerate()
        .map(|(i, (journal, count))| {
            Bar::new((n - 1 - i) as f64, *count as f64)
                .name(journal)
                .width(0.7)
        })
        .collect();
    Plot::new("top_journals")
        .x_axis_label("Papers")
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&axis, mark.value)
        })
        .y_axis_min_width(160.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().color(Color32::LIGHT_GREEN));
        });
}

fn sources(ui: &mut Ui, view: &DashboardView, colors: &ColorMap) {
    if view.sources.is_empty() {
        ui.label(NO_DATA);
        return;
    }
    let height = half_height(ui);

    ui.strong("Papers by source");
    let axis: Vec<String> = view.sources.iter().map(|(s, _)| s.clone()).collect();
    let bars: Vec<Bar> = view
        .sources
        .iter()
        .enumerate()
        .map(|(i, (source, count))| {
            Bar::new(i as f64, *count as f64)
                .name(source)
                .fill(colors.color_for(source))
                .width(0.7)
        })
        .collect();
    Plot::new("source_distribution")
        .height(height)
        .y_axis_label("Papers")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&axis, mark.value)
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });

    ui.strong("Sources over time");
    Plot::new("source_by_year")
        .height(height)
        .legend(Legend::default())
        .x_axis_label("Year")
        .x_axis_formatter(integer_label)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (source, years) in &view.source_by_year {
                let points: PlotPoints = years
                    .iter()
                    .map(|(&year, &count)| [year as f64, count as f64])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(source)
                        .color(colors.color_for(source))
                        .width(1.5),
                );
            }
        });
}

fn content(ui: &mut Ui, view: &DashboardView) {
    let height = half_height(ui);

    ui.strong("Abstract length (characters)");
    match &view.abstract_stats {
        Some(s) => {
            ui.label(format!(
                "{} abstracts · mean {:.0} · median {:.0} · range {:.0}–{:.0}",
                s.count, s.mean, s.median, s.min, s.max
            ));
            let bars: Vec<Bar> = view
                .abstract_histogram
                .iter()
                .map(|b| {
                    let width = (b.end - b.start).max(1.0);
                    Bar::new((b.start + b.end) / 2.0, b.count as f64).width(width)
                })
                .collect();
            Plot::new("abstract_lengths")
                .height(height)
                .x_axis_label("Characters")
                .y_axis_label("Papers")
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_RED));
                });
        }
        None => {
            ui.label("Abstract length: no data");
        }
    }

    ui.strong("Title word count");
    match &view.title_stats {
        Some(t) => {
            ui.label(format!(
                "mean {:.1} · median {:.0} · most common {} words",
                t.summary.mean, t.summary.median, t.mode
            ));
            let spread = BoxSpread::new(t.summary.min, t.q1, t.summary.median, t.q3, t.summary.max);
            let elem = BoxElem::new(0.0, spread).name("Title words").box_width(0.5);
            Plot::new("title_words")
                .height(height)
                .y_axis_label("Words")
                .show_x(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.box_plot(BoxPlot::new(vec![elem]).color(Color32::GOLD));
                });
        }
        None => {
            ui.label("Title word count: no data");
        }
    }
}

fn data(ui: &mut Ui, view: &DashboardView, sample_rows: usize) {
    if view.table.is_empty() {
        ui.label(NO_DATA);
        return;
    }

    ui.strong(format!("First {} papers", sample_rows.min(view.table.len())));
    let base: Vec<Field> = [Column::CordUid, Column::Title, Column::Journal, Column::PublishTime, Column::Source]
        .into_iter()
        .filter(|c| view.table.schema.has(*c))
        .map(Field::Known)
        .collect();
    let derived: Vec<DerivedColumn> = [DerivedColumn::PublicationYear, DerivedColumn::AbstractWordCount]
        .into_iter()
        .filter(|d| view.table.derived.contains(d))
        .collect();

    ui.push_id("sample_rows", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(320.0)
            .columns(TableColumn::auto().at_least(60.0), base.len() + derived.len())
            .header(20.0, |mut header| {
                for field in &base {
                    header.col(|ui| {
                        ui.strong(field.name());
                    });
                }
                for d in &derived {
                    header.col(|ui| {
                        ui.strong(d.header());
                    });
                }
            })
            .body(|mut body| {
                for paper in view.table.rows.iter().take(sample_rows) {
                    body.row(18.0, |mut row| {
                        for field in &base {
                            let text = paper.cell(field).unwrap_or_default();
                            row.col(|ui| {
                                ui.label(truncated(&text, 60)).on_hover_text(&text);
                            });
                        }
                        for d in &derived {
                            let text = paper.derived_cell(*d).unwrap_or_default();
                            row.col(|ui| {
                                ui.label(text);
                            });
                        }
                    });
                }
            });
    });

    ui.add_space(8.0);
    ui.strong("Missing values");
    if view.missing.is_empty() {
        ui.label("No missing values.");
        return;
    }
    egui::Grid::new("missing_values")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            ui.strong("Column");
            ui.strong("Missing");
            ui.strong("Percent");
            ui.end_row();
            for e in &view.missing.entries {
                ui.label(&e.column);
                ui.label(e.count.to_string());
                ui.label(format!("{:.1}%", e.percentage));
                ui.end_row();
            }
        });
}

fn truncated(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{cut}…")
    }
}
