use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use cord_explorer::data::filter::{Selection, ALL};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the widgets.
    let options = state.options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Publication year ----
            if options.has_dates {
                ui.strong("Publication year");
                match options.years {
                    Some((min, max)) => {
                        let (mut lo, mut hi) = state.year_slider;
                        let from = ui.add(egui::Slider::new(&mut lo, min..=max).text("from"));
                        let to = ui.add(egui::Slider::new(&mut hi, min..=max).text("to"));
                        if from.changed() || to.changed() {
                            state.set_year_range(lo, hi);
                        }
                        if state.criteria.year_range.is_some() {
                            ui.label(RichText::new("Undated papers hidden").weak());
                        }
                    }
                    None => {
                        ui.label("No dated papers.");
                    }
                }
                ui.separator();
            }

            // ---- Journal ----
            if options.has_journals {
                ui.strong("Journal");
                if let Some(choice) =
                    selection_combo(ui, "journal", &state.criteria.journal, &options.journals)
                {
                    state.set_journal(choice);
                }
                ui.separator();
            }

            // ---- Source ----
            if options.has_sources {
                ui.strong("Source");
                if let Some(choice) =
                    selection_combo(ui, "source", &state.criteria.source, &options.sources)
                {
                    state.set_source(choice);
                }
                for (label, color) in state.color_map.legend_entries() {
                    ui.label(RichText::new(format!("■ {label}")).color(color));
                }
                ui.separator();
            }

            // ---- Abstract ----
            if options.has_abstracts {
                let mut required = state.criteria.require_abstract;
                if ui.checkbox(&mut required, "Only papers with abstracts").changed() {
                    state.set_require_abstract(required);
                }
                ui.separator();
            }

            if ui
                .add_enabled(state.filters_active(), egui::Button::new("Reset filters"))
                .clicked()
            {
                state.reset_filters();
            }

            ui.add_space(8.0);
            ui.label(format!(
                "{} of {} papers match",
                state.visible_count(),
                state.total_count()
            ));
        });
}

/// Combo box offering "All" plus every value; returns the new choice when it changes.
fn selection_combo(
    ui: &mut Ui,
    id: &str,
    current: &Selection,
    values: &[String],
) -> Option<Selection> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.to_string())
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_all(), ALL).clicked() && !current.is_all() {
                picked = Some(Selection::All);
            }
            for value in values {
                let selected = matches!(current, Selection::Exact(v) if v == value);
                if ui.selectable_label(selected, value).clicked() && !selected {
                    picked = Some(Selection::Exact(value.clone()));
                }
            }
        });
    picked
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if state.dataset.is_some() {
            ui.label(format!(
                "{} papers loaded, {} visible",
                state.total_count(),
                state.visible_count()
            ));
            ui.separator();
            let origin = RichText::new(&state.origin);
            if state.synthesized {
                ui.label(origin.color(Color32::YELLOW))
                    .on_hover_text("Run cord-analyze to produce a real snapshot");
            } else {
                ui.label(origin);
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open paper metadata")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV snapshot", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open(&path);
    }
}
