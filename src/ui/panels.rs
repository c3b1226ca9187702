use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use timss_explorer::data::{Choice, Range, Sex};

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

    let mut changed = false;
    let limits = state.limits.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Gender ----
            ui.strong("Gender");
            let current = state.filters.sex.map_or("Any", Sex::label);
            egui::ComboBox::from_id_salt("sex_filter")
                .selected_text(current)
                .show_ui(ui, |ui: &mut Ui| {
                    changed |= ui.selectable_value(&mut state.filters.sex, None, "Any").changed();
                    for sex in Sex::ALL {
                        changed |= ui
                            .selectable_value(&mut state.filters.sex, Some(sex), sex.label())
                            .changed();
                    }
                });
            ui.separator();

            // ---- Numeric ranges ----
            changed |= range_filter(ui, "Age", &mut state.filters.age, limits.age, 1.0);
            changed |= range_filter(ui, "Math score", &mut state.filters.math, limits.math, 1.0);
            changed |= range_filter(
                ui,
                "Home resources",
                &mut state.filters.home_resources,
                limits.home_resources,
                1.0,
            );

            // ---- Schools ----
            let Some(selected) = state.filters.schools.as_mut() else {
                return;
            };
            let header_text = if selected.contains(&Choice::All) {
                format!("Schools  (all/{})", limits.schools.len())
            } else {
                format!("Schools  ({}/{})", selected.len(), limits.schools.len())
            };

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("school_filter")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    let mut all = selected.contains(&Choice::All);
                    if ui.checkbox(&mut all, "All schools").changed() {
                        if all {
                            selected.insert(Choice::All);
                        } else {
                            selected.remove(&Choice::All);
                        }
                        changed = true;
                    }
                    if ui.small_button("None").clicked() {
                        selected.clear();
                        changed = true;
                    }

                    ui.add_enabled_ui(!all, |ui: &mut Ui| {
                        for school in &limits.schools {
                            let choice = Choice::Value(school.clone());
                            let mut checked = selected.contains(&choice);
                            let mut text = RichText::new(school.to_string());
                            if let Some(cm) = &state.school_colors {
                                text = text.color(cm.color_for(school));
                            }
                            if ui.checkbox(&mut checked, text).changed() {
                                if checked {
                                    selected.insert(choice);
                                } else {
                                    selected.remove(&choice);
                                }
                                changed = true;
                            }
                        }
                    });
                });
        });

    if changed {
        state.refilter();
    }
}

/// Two sliders bounding an inclusive range. Returns whether it changed.
fn range_filter(
    ui: &mut Ui,
    label: &str,
    range: &mut Option<Range>,
    limits: Option<Range>,
    step: f64,
) -> bool {
    let (Some(r), Some(limits)) = (range.as_mut(), limits) else {
        return false;
    };
    ui.strong(label);
    let before = *r;
    ui.add(egui::Slider::new(&mut r.low, limits.low..=limits.high).step_by(step).text("from"));
    ui.add(egui::Slider::new(&mut r.high, limits.low..=limits.high).step_by(step).text("to"));
    ui.separator();
    *r != before
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} students loaded, {} visible",
                ds.len(),
                state.filtered.len()
            ));
        }

        ui.separator();

        for tab in crate::state::Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.title());
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
        .set_title("Open student data")
        .add_filter("Supported files", &["feather", "arrow", "parquet", "pq", "json", "csv"])
        .add_filter("Feather", &["feather", "arrow"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
