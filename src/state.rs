use std::path::Path;

use timss_explorer::config::Settings;
use timss_explorer::data::codes::SEX_COLUMN;
use timss_explorer::data::criteria::schools_in_order;
use timss_explorer::data::loader::load_file;
use timss_explorer::data::summary::{Overview, SCHOOL_COLUMN};
use timss_explorer::data::{
    derive, filter, DashboardFilters, FieldValue, FilteredView, Range, StudentDataset,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Math,
    Demographics,
    Records,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Math, Tab::Demographics, Tab::Records];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Math => "Math Scores",
            Tab::Demographics => "Demographics",
            Tab::Records => "Records",
        }
    }
}

/// Slider limits, fixed per dataset.
#[derive(Debug, Clone, Default)]
pub struct FilterLimits {
    pub age: Option<Range>,
    pub math: Option<Range>,
    pub home_resources: Option<Range>,
    /// Every school id in file order.
    pub schools: Vec<FieldValue>,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub settings: Settings,

    /// Loaded dataset with derived columns (None until user loads a file).
    pub dataset: Option<StudentDataset>,

    /// Current widget selections.
    pub filters: DashboardFilters,

    pub limits: FilterLimits,

    /// Records passing the current filters (cached).
    pub filtered: StudentDataset,

    pub overview: Option<Overview>,

    pub sex_colors: Option<ColorMap>,
    pub school_colors: Option<ColorMap>,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let mut state = AppState {
            settings,
            ..Default::default()
        };
        if let Some(path) = state.settings.data_path.clone() {
            state.open(&path);
        }
        state
    }

    /// Load, derive and install a dataset; failures end up in the status line.
    pub fn open(&mut self, path: &Path) {
        let result = load_file(path).and_then(|raw| Ok(derive(raw)?));
        match result {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to open {}: {e:#}", path.display());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a derived dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: StudentDataset) {
        self.filters = DashboardFilters::defaults(&dataset, self.settings.default_school_count);
        self.limits = FilterLimits {
            age: self.filters.age,
            math: self.filters.math,
            home_resources: self.filters.home_resources,
            schools: schools_in_order(&dataset),
        };
        self.sex_colors = dataset
            .unique_values
            .get(SEX_COLUMN)
            .map(ColorMap::new);
        self.school_colors = dataset
            .unique_values
            .get(SCHOOL_COLUMN)
            .map(ColorMap::new);

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered records after a widget change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match filter(ds, &self.filters.criteria()) {
            Ok(view) => {
                self.overview = Some(Overview::of(&view));
                self.status_message = view.warning().map(|w| w.to_string());
                self.filtered = view.to_dataset();
            }
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
                self.filtered = StudentDataset::default();
                self.overview = None;
            }
        }
    }

    /// View over the records passing the current filters.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::all(&self.filtered)
    }
}
