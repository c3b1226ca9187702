use eframe::egui::{self, Color32, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use timss_explorer::data::codes::SEX_COLUMN;
use timss_explorer::data::derive::{standard_groups, HOME_RESOURCES_COUNT, MATH_AVG};
use timss_explorer::data::summary::{
    histogram, mean, scatter_points, value_counts, value_counts_desc, AGE_COLUMN, SCHOOL_COLUMN,
    STUDENT_COLUMN,
};
use timss_explorer::data::{FieldValue, FilteredView};

use crate::color::ColorMap;
use crate::state::{AppState, Tab};

const CHART_HEIGHT: f32 = 260.0;

/// Columns listed in the records table.
const RECORD_COLUMNS: [&str; 6] = [
    SCHOOL_COLUMN,
    STUDENT_COLUMN,
    SEX_COLUMN,
    AGE_COLUMN,
    MATH_AVG,
    HOME_RESOURCES_COUNT,
];

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the active tab in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore students  (File → Open…)");
        });
        return;
    }

    let view = state.view();
    ui.heading(state.tab.title());
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| match state.tab {
        Tab::Overview => overview(ui, state, &view),
        Tab::Math => math_scores(ui, state, &view),
        Tab::Demographics => demographics(ui, state, &view),
        Tab::Records => records_table(ui, &view),
    });
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn overview(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    if let Some(ov) = &state.overview {
        ui.columns(3, |cols| {
            metric(&mut cols[0], "Total Schools", ov.schools.to_string());
            metric(&mut cols[1], "Total Students", ov.students.to_string());
            metric(&mut cols[2], "Avg Student Age", ov.mean_age_label());
        });
        ui.separator();
    }

    ui.columns(2, |cols| {
        cols[0].strong("Gender Distribution");
        categorical_bars(
            &mut cols[0],
            "gender_chart",
            value_counts(view, SEX_COLUMN),
            state.sex_colors.as_ref(),
        );

        cols[1].strong("Student Count per School");
        categorical_bars(
            &mut cols[1],
            "school_chart",
            value_counts_desc(view, SCHOOL_COLUMN),
            state.school_colors.as_ref(),
        );
    });
}

fn math_scores(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    ui.strong("Distribution of average math score");
    histogram_chart(ui, "math_hist", view, MATH_AVG, state.settings.histogram_bins);

    ui.strong("Mean score by sub-domain");
    let bars: Vec<Bar> = standard_groups()
        .iter()
        .filter(|g| g.name != HOME_RESOURCES_COUNT)
        .enumerate()
        .filter_map(|(i, g)| {
            let m = mean(view, &g.name)?;
            Some(Bar::new(i as f64, m).name(&g.name).width(0.7))
        })
        .collect();
    Plot::new("domain_means")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label("Mean score")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
        });

    ui.strong("Math score vs home resources");
    let points = scatter_points(view, HOME_RESOURCES_COUNT, MATH_AVG);
    Plot::new("math_vs_resources")
        .height(CHART_HEIGHT)
        .x_axis_label("Home resources count")
        .y_axis_label("Math average")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .radius(2.0)
                    .color(Color32::LIGHT_BLUE),
            );
        });
}

fn demographics(ui: &mut Ui, state: &AppState, view: &FilteredView<'_>) {
    let bins = state.settings.histogram_bins;
    ui.strong("Age distribution");
    histogram_chart(ui, "age_hist", view, AGE_COLUMN, bins);

    ui.strong("Home resources count");
    histogram_chart(ui, "resources_hist", view, HOME_RESOURCES_COUNT, bins);
}

fn records_table(ui: &mut Ui, view: &FilteredView<'_>) {
    let records: Vec<_> = view.records().collect();
    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().at_least(80.0), RECORD_COLUMNS.len())
        .header(20.0, |mut header| {
            for col in RECORD_COLUMNS {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, records.len(), |mut row| {
                let rec = records[row.index()];
                for col in RECORD_COLUMNS {
                    row.col(|ui| {
                        ui.label(rec.get(col).map_or_else(String::new, |v| v.to_string()));
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.heading(value);
    });
}

/// One bar per category, coloured from `colors` when given.
fn categorical_bars(
    ui: &mut Ui,
    id: &str,
    counts: Vec<(FieldValue, usize)>,
    colors: Option<&ColorMap>,
) {
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (value, n))| {
            let color = colors.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(value));
            Bar::new(i as f64, *n as f64)
                .name(value.to_string())
                .fill(color)
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label("Number of students")
        .show_x(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn histogram_chart(ui: &mut Ui, id: &str, view: &FilteredView<'_>, column: &str, bins: usize) {
    let bars: Vec<Bar> = histogram(view, column, bins)
        .iter()
        .map(|b| Bar::new(b.center(), b.count as f64).width(b.width()))
        .collect();
    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(column)
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
        });
}
