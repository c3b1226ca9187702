use std::fmt;

use super::error::{ResolveError, UnknownCode};
use super::model::{FieldValue, StudentRecord};

/// Column carrying the student's sex code.
pub const SEX_COLUMN: &str = "ITSEX";

// ---------------------------------------------------------------------------
// Sex – the one coded categorical the filters act on
// ---------------------------------------------------------------------------

/// Student sex, resolved from the raw `ITSEX` code when the dataset is loaded.
///
/// Canonical mapping (TIMSS codebook): `1` → [`Sex::Female`], `2` → [`Sex::Male`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    /// Numeric code as stored in the raw file.
    pub fn code(self) -> i64 {
        match self {
            Sex::Female => 1,
            Sex::Male => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Sex::Female),
            2 => Some(Sex::Male),
            _ => None,
        }
    }

    /// Accepts the labels written by earlier exports of the cleaned data.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "female" | "girl" | "f" => Some(Sex::Female),
            "male" | "boy" | "m" => Some(Sex::Male),
            _ => None,
        }
    }

    /// Interpret a raw cell. `Ok(None)` for null, `Err` for an unknown code.
    pub fn from_value(value: &FieldValue) -> Result<Option<Self>, UnknownCode> {
        let resolved = match value {
            FieldValue::Null => return Ok(None),
            FieldValue::Sex(s) => Some(*s),
            FieldValue::Integer(i) => Sex::from_code(*i),
            FieldValue::Float(f) => whole(*f).and_then(Sex::from_code),
            FieldValue::Text(t) => Sex::from_label(t).or_else(|| {
                t.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(whole)
                    .and_then(Sex::from_code)
            }),
        };
        resolved.map(Some).ok_or_else(|| UnknownCode {
            column: SEX_COLUMN.to_string(),
            value: value.to_string(),
        })
    }
}

/// `2.0` → `Some(2)`; fractional or non-finite codes → `None`.
fn whole(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Replace the raw sex code of every record with a [`FieldValue::Sex`].
///
/// Records without the column are left alone. Stops at the first unknown code.
pub fn resolve_sex(records: &mut [StudentRecord]) -> Result<(), ResolveError> {
    for (row, rec) in records.iter_mut().enumerate() {
        let Some(raw) = rec.fields.get_mut(SEX_COLUMN) else {
            continue;
        };
        *raw = match Sex::from_value(raw).map_err(|source| ResolveError { row, source })? {
            Some(sex) => FieldValue::Sex(sex),
            None => FieldValue::Null,
        };
    }
    Ok(())
}
