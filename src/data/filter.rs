use std::collections::{BTreeMap, BTreeSet};

use super::error::{EmptyResultWarning, SchemaError};
use super::model::{FieldValue, StudentDataset, StudentRecord};

// ---------------------------------------------------------------------------
// Predicates: what a single column must satisfy
// ---------------------------------------------------------------------------

/// Entry of a set-membership criterion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Choice {
    /// Matches every value ("no restriction").
    All,
    Value(FieldValue),
}

/// A rule over one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches everything; the column need not exist.
    Inactive,
    Equals(FieldValue),
    /// Inclusive numeric range. `low > high` matches nothing.
    Between { low: f64, high: f64 },
    /// Value must be one of the choices; [`Choice::All`] short-circuits.
    OneOf(BTreeSet<Choice>),
}

impl Predicate {
    pub fn between(low: f64, high: f64) -> Self {
        Predicate::Between { low, high }
    }

    pub fn one_of<I: IntoIterator<Item = FieldValue>>(values: I) -> Self {
        Predicate::OneOf(values.into_iter().map(Choice::Value).collect())
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Predicate::Inactive)
    }

    /// Whether a (possibly missing) cell satisfies the predicate.
    pub fn matches(&self, value: Option<&FieldValue>) -> bool {
        match self {
            Predicate::Inactive => true,
            Predicate::OneOf(choices) if choices.contains(&Choice::All) => true,
            Predicate::Equals(target) => value.is_some_and(|v| v.same_as(target)),
            Predicate::Between { low, high } => value
                .and_then(FieldValue::as_f64)
                .is_some_and(|v| *low <= v && v <= *high),
            Predicate::OneOf(choices) => value.is_some_and(|v| {
                choices.iter().any(|c| match c {
                    Choice::Value(target) => v.same_as(target),
                    Choice::All => true,
                })
            }),
        }
    }
}

/// Per-column criteria: column name → predicate. At most one per column.
/// Columns absent from the map are unconstrained.
pub type FilterState = BTreeMap<String, Predicate>;

// ---------------------------------------------------------------------------
// FilteredView – read-only subset of a dataset
// ---------------------------------------------------------------------------

/// The records of a dataset satisfying every active criterion, in file order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a StudentDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every record.
    pub fn all(dataset: &'a StudentDataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a StudentDataset {
        self.dataset
    }

    /// Positions of the surviving records in the underlying dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a StudentRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    /// Cells of one column over the view, skipping records without it.
    pub fn column<'c>(&'c self, column: &'c str) -> impl Iterator<Item = &'a FieldValue> + 'c {
        self.records().filter_map(move |r| r.get(column))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn warning(&self) -> Option<EmptyResultWarning> {
        self.is_empty().then_some(EmptyResultWarning)
    }

    /// Copy the surviving records into a standalone dataset.
    pub fn to_dataset(&self) -> StudentDataset {
        StudentDataset::with_columns(
            self.dataset.column_names.iter().cloned(),
            self.records().cloned().collect(),
        )
    }
}

/// Return the view of records that pass all active criteria.
///
/// A record passes a criterion when:
/// * the predicate is [`Predicate::Inactive`] → passes
/// * a set-membership predicate contains [`Choice::All`] → passes
/// * otherwise the record's cell satisfies the predicate; null or absent cells fail
///
/// An active criterion on a column the dataset does not have is a [`SchemaError`].
pub fn filter<'a>(
    dataset: &'a StudentDataset,
    criteria: &FilterState,
) -> Result<FilteredView<'a>, SchemaError> {
    let active: Vec<(&String, &Predicate)> = criteria
        .iter()
        .filter(|(_, p)| p.is_active())
        .collect();

    for (col, _) in &active {
        if !dataset.has_column(col) {
            return Err(SchemaError::new(col.as_str(), format!("filter on `{col}`")));
        }
    }

    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| active.iter().all(|(col, p)| p.matches(rec.get(col))))
        .map(|(i, _)| i)
        .collect();

    let view = FilteredView { dataset, indices };
    if let Some(warning) = view.warning() {
        log::warn!("{warning} ({} active criteria)", active.len());
    } else {
        log::debug!("{} of {} records match", view.len(), dataset.len());
    }
    Ok(view)
}
