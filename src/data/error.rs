use thiserror::Error;

/// A column required by a derived metric or an active filter is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing column `{column}` required by {required_by}")]
pub struct SchemaError {
    pub column: String,
    /// The metric or criterion that asked for the column.
    pub required_by: String,
}

impl SchemaError {
    pub fn new(column: impl Into<String>, required_by: impl Into<String>) -> Self {
        SchemaError {
            column: column.into(),
            required_by: required_by.into(),
        }
    }
}

/// Informational: no record satisfied every active criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no records match the active filters")]
pub struct EmptyResultWarning;

/// A coded cell that maps to no known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised code {value} in column `{column}`")]
pub struct UnknownCode {
    pub column: String,
    /// The raw cell as read from the file.
    pub value: String,
}

/// Code resolution failed on a given row (0-based, file order).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}")]
pub struct ResolveError {
    pub row: usize,
    #[source]
    pub source: UnknownCode,
}
