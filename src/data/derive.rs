use super::error::SchemaError;
use super::model::{FieldValue, StudentDataset, StudentRecord};

pub const MATH_AVG: &str = "Math_Avg";
pub const HOME_RESOURCES_COUNT: &str = "Home_Resources_Count";

// ---------------------------------------------------------------------------
// Metric groups
// ---------------------------------------------------------------------------

/// How the cells of a group are reduced to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Arithmetic mean of the non-null cells; null if every cell is null.
    Mean,
    /// Sum of the non-null cells; stored as an integer when integral.
    Sum,
}

/// A derived column computed from a fixed group of raw columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroup {
    pub name: String,
    pub columns: Vec<String>,
    pub aggregation: Aggregation,
}

impl MetricGroup {
    pub fn new(name: &str, columns: Vec<String>, aggregation: Aggregation) -> Self {
        MetricGroup {
            name: name.to_string(),
            columns,
            aggregation,
        }
    }

    /// Five plausible values `{prefix}01..{prefix}05`, averaged.
    pub fn plausible_values(name: &str, prefix: &str) -> Self {
        let columns = (1..=5).map(|i| format!("{prefix}{i:02}")).collect();
        Self::new(name, columns, Aggregation::Mean)
    }

    /// Compute the group's value for one record.
    pub fn evaluate(&self, record: &StudentRecord) -> FieldValue {
        let values = self
            .columns
            .iter()
            .filter_map(|c| record.get(c).and_then(FieldValue::as_f64));

        match self.aggregation {
            Aggregation::Mean => {
                let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n == 0 {
                    FieldValue::Null
                } else {
                    FieldValue::Float(sum / n as f64)
                }
            }
            Aggregation::Sum => {
                let sum: f64 = values.sum();
                if sum.fract() == 0.0 && sum.abs() < i64::MAX as f64 {
                    FieldValue::Integer(sum as i64)
                } else {
                    FieldValue::Float(sum)
                }
            }
        }
    }
}

/// The metric groups the dashboard works with.
pub fn standard_groups() -> Vec<MetricGroup> {
    let home_flags = ('A'..='J').map(|c| format!("BSBG05{c}")).collect();
    vec![
        MetricGroup::plausible_values(MATH_AVG, "BSMMAT"),
        MetricGroup::plausible_values("Numeracy_Avg", "BSMNUM"),
        MetricGroup::plausible_values("Algebra_Avg", "BSMALG"),
        MetricGroup::plausible_values("Geometry_Avg", "BSMGEO"),
        MetricGroup::plausible_values("Knowledge_Avg", "BSMKNO"),
        MetricGroup::plausible_values("Application_Avg", "BSMAPP"),
        MetricGroup::plausible_values("Reasoning_Avg", "BSMREA"),
        MetricGroup::new(HOME_RESOURCES_COUNT, home_flags, Aggregation::Sum),
    ]
}

// ---------------------------------------------------------------------------
// derive
// ---------------------------------------------------------------------------

/// Append every standard derived metric to each record.
pub fn derive(dataset: StudentDataset) -> Result<StudentDataset, SchemaError> {
    derive_with(dataset, &standard_groups())
}

/// Append the given derived metrics to each record.
///
/// All groups are checked before any record is touched, so a missing column
/// leaves nothing half-computed. Re-running overwrites earlier derived values
/// with identical ones.
pub fn derive_with(
    mut dataset: StudentDataset,
    groups: &[MetricGroup],
) -> Result<StudentDataset, SchemaError> {
    for group in groups {
        if let Some(missing) = group.columns.iter().find(|c| !dataset.has_column(c)) {
            return Err(SchemaError::new(missing.as_str(), format!("derived metric `{}`", group.name)));
        }
    }

    for rec in &mut dataset.records {
        for group in groups {
            let value = group.evaluate(rec);
            rec.fields.insert(group.name.clone(), value);
        }
    }
    dataset
        .column_names
        .extend(groups.iter().map(|g| g.name.clone()));
    dataset.reindex();

    log::debug!(
        "derived {} metrics over {} records",
        groups.len(),
        dataset.len()
    );
    Ok(dataset)
}
