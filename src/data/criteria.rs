use std::collections::{BTreeSet, HashSet};

use super::codes::{Sex, SEX_COLUMN};
use super::derive::{HOME_RESOURCES_COUNT, MATH_AVG};
use super::filter::{Choice, FilteredView, FilterState, Predicate};
use super::model::{FieldValue, StudentDataset};
use super::summary::{bounds, AGE_COLUMN, SCHOOL_COLUMN};

/// Inclusive numeric range picked on a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub fn new(low: f64, high: f64) -> Self {
        Range { low, high }
    }

    /// Observed bounds of `column` widened to whole numbers.
    pub fn covering(dataset: &StudentDataset, column: &str) -> Option<Self> {
        bounds(&FilteredView::all(dataset), column)
            .map(|(lo, hi)| Range::new(lo.floor(), hi.ceil()))
    }
}

/// The dashboard's widget state, one field per sidebar control.
///
/// `None` leaves that column unconstrained.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardFilters {
    pub sex: Option<Sex>,
    pub age: Option<Range>,
    /// Selected school ids; may hold [`Choice::All`].
    pub schools: Option<BTreeSet<Choice>>,
    pub math: Option<Range>,
    pub home_resources: Option<Range>,
}

impl DashboardFilters {
    /// Initial widget state for a freshly derived dataset: first observed sex,
    /// full ranges, and the first `school_count` schools in file order.
    pub fn defaults(dataset: &StudentDataset, school_count: usize) -> Self {
        let sex = dataset.records.iter().find_map(|r| match r.get(SEX_COLUMN) {
            Some(FieldValue::Sex(s)) => Some(*s),
            _ => None,
        });

        DashboardFilters {
            sex,
            age: Range::covering(dataset, AGE_COLUMN),
            schools: dataset
                .has_column(SCHOOL_COLUMN)
                .then(|| first_schools(dataset, school_count)),
            math: Range::covering(dataset, MATH_AVG),
            home_resources: Range::covering(dataset, HOME_RESOURCES_COUNT),
        }
    }

    /// The generic criteria the engine filters with.
    pub fn criteria(&self) -> FilterState {
        fn range(r: &Option<Range>) -> Predicate {
            r.map_or(Predicate::Inactive, |r| Predicate::between(r.low, r.high))
        }

        FilterState::from([
            (
                SEX_COLUMN.to_string(),
                self.sex
                    .map_or(Predicate::Inactive, |s| Predicate::Equals(FieldValue::Sex(s))),
            ),
            (AGE_COLUMN.to_string(), range(&self.age)),
            (
                SCHOOL_COLUMN.to_string(),
                self.schools
                    .clone()
                    .map_or(Predicate::Inactive, Predicate::OneOf),
            ),
            (MATH_AVG.to_string(), range(&self.math)),
            (HOME_RESOURCES_COUNT.to_string(), range(&self.home_resources)),
        ])
    }
}

/// School ids in order of first appearance.
pub fn schools_in_order(dataset: &StudentDataset) -> Vec<FieldValue> {
    let mut seen = HashSet::new();
    dataset
        .records
        .iter()
        .filter_map(|r| r.get(SCHOOL_COLUMN))
        .filter(|v| !v.is_null() && seen.insert(*v))
        .cloned()
        .collect()
}

fn first_schools(dataset: &StudentDataset, n: usize) -> BTreeSet<Choice> {
    schools_in_order(dataset)
        .into_iter()
        .take(n)
        .map(Choice::Value)
        .collect()
}
