use std::collections::{BTreeSet, HashMap};

use super::filter::FilteredView;
use super::model::FieldValue;

pub const SCHOOL_COLUMN: &str = "IDSCHOOL";
pub const STUDENT_COLUMN: &str = "IDSTUD";
pub const AGE_COLUMN: &str = "BSDAGE";

// ---------------------------------------------------------------------------
// Scalar reductions
// ---------------------------------------------------------------------------

/// Number of distinct non-null values of `column` in the view.
pub fn distinct_count(view: &FilteredView<'_>, column: &str) -> usize {
    view.column(column)
        .filter(|v| !v.is_null())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Arithmetic mean of the numeric cells of `column`.
///
/// `None` means "not applicable": the view is empty or holds no numbers.
pub fn mean(view: &FilteredView<'_>, column: &str) -> Option<f64> {
    let (sum, n) = view
        .column(column)
        .filter_map(FieldValue::as_f64)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Smallest and largest numeric value of `column`.
pub fn bounds(view: &FilteredView<'_>, column: &str) -> Option<(f64, f64)> {
    view.column(column)
        .filter_map(FieldValue::as_f64)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Key statistics shown at the top of the overview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overview {
    pub schools: usize,
    pub students: usize,
    pub mean_age: Option<f64>,
}

impl Overview {
    pub fn of(view: &FilteredView<'_>) -> Self {
        Overview {
            schools: distinct_count(view, SCHOOL_COLUMN),
            students: distinct_count(view, STUDENT_COLUMN),
            mean_age: mean(view, AGE_COLUMN),
        }
    }

    /// Mean age for display, `"n/a"` when not applicable.
    pub fn mean_age_label(&self) -> String {
        match self.mean_age {
            Some(age) => format!("{age:.2}"),
            None => "n/a".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouped reductions (chart inputs)
// ---------------------------------------------------------------------------

/// Count of each non-null value of `column`, in order of first appearance.
pub fn value_counts(view: &FilteredView<'_>, column: &str) -> Vec<(FieldValue, usize)> {
    let mut positions: HashMap<&FieldValue, usize> = HashMap::new();
    let mut counts: Vec<(FieldValue, usize)> = Vec::new();
    for value in view.column(column).filter(|v| !v.is_null()) {
        match positions.get(value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }
    counts
}

/// [`value_counts`] ordered by descending count; ties keep first-seen order.
pub fn value_counts_desc(view: &FilteredView<'_>, column: &str) -> Vec<(FieldValue, usize)> {
    let mut counts = value_counts(view, column);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// One bar of a histogram: `[start, end)`, the last bin closed on the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width histogram of the numeric cells of `column`.
///
/// Empty when the view has no numbers or `bins == 0`. A column with a single
/// distinct value yields one unit-wide bin.
pub fn histogram(view: &FilteredView<'_>, column: &str, bins: usize) -> Vec<Bin> {
    let Some((lo, hi)) = bounds(view, column) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if hi == lo {
        let count = view.column(column).filter_map(FieldValue::as_f64).count();
        return vec![Bin { start: lo - 0.5, end: lo + 0.5, count }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: lo + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in view.column(column).filter_map(FieldValue::as_f64) {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// `(x, y)` pairs for records where both columns are numeric.
pub fn scatter_points(view: &FilteredView<'_>, x_column: &str, y_column: &str) -> Vec<[f64; 2]> {
    view.records()
        .filter_map(|r| {
            let x = r.get(x_column)?.as_f64()?;
            let y = r.get(y_column)?.as_f64()?;
            Some([x, y])
        })
        .collect()
}
