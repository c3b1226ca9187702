use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::codes::Sex;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of the student table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes of the cleaned data file.
/// Used as a `BTreeSet` key downstream, so `FieldValue` must be `Ord`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    /// Sex code resolved at load time.
    Sex(Sex),
    Text(String),
    Null,
}

// -- Manual Eq/Ord/Hash so we can put FieldValue in BTreeSet and HashMap --
// Floats compare by `total_cmp` and hash by bits, so all three agree.

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for FieldValue {}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use FieldValue::*;
        fn discriminant(v: &FieldValue) -> u8 {
            match v {
                Null => 0,
                Sex(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Sex(a), Sex(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for FieldValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Text(s) => s.hash(state),
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::Sex(s) => s.hash(state),
            FieldValue::Null => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v:.2}"),
            FieldValue::Sex(s) => write!(f, "{s}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Numeric view of the value; `None` for non-numeric and null cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) if v.is_nan() => None,
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null) || matches!(self, FieldValue::Float(v) if v.is_nan())
    }

    /// Value equality as the filters see it: numbers compare by value, so
    /// `Integer(2)` matches `Float(2.0)`. Null matches nothing.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

// ---------------------------------------------------------------------------
// StudentRecord – one row of the cleaned table
// ---------------------------------------------------------------------------

/// A single student's test administration and questionnaire responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRecord {
    /// Column name → value, raw and derived columns alike.
    pub fields: BTreeMap<String, FieldValue>,
}

impl StudentRecord {
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        StudentRecord {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }
}

// ---------------------------------------------------------------------------
// StudentDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct StudentDataset {
    /// All records in file order.
    pub records: Vec<StudentRecord>,
    /// Sorted column names: the declared schema plus any column a record carries.
    /// Survives a table with zero rows.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<FieldValue>>,
}

impl StudentDataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<StudentRecord>) -> Self {
        Self::with_columns(Vec::<String>::new(), records)
    }

    /// Build a dataset whose schema lists `columns` even when no record holds them.
    pub fn with_columns<I, S>(columns: I, records: Vec<StudentRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = StudentDataset {
            records,
            column_names: columns.into_iter().map(Into::into).collect(),
            unique_values: BTreeMap::new(),
        };
        dataset.reindex();
        dataset
    }

    /// Recompute `column_names` and `unique_values` after records changed.
    /// Columns already in the schema are kept.
    pub(crate) fn reindex(&mut self) {
        let mut column_names_set: BTreeSet<String> = self.column_names.drain(..).collect();
        let mut unique_values: BTreeMap<String, BTreeSet<FieldValue>> = BTreeMap::new();

        for rec in &self.records {
            for (col, val) in &rec.fields {
                column_names_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        self.column_names = column_names_set.into_iter().collect();
        self.unique_values = unique_values;
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names
            .binary_search_by(|c| c.as_str().cmp(column))
            .is_ok()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
