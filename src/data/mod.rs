/// Data layer: core types, loading, derivation and filtering.
///
/// Architecture:
/// ```text
///  .feather / .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → StudentDataset (sex codes resolved)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  derive   │  append Math_Avg, sub-domain averages, Home_Resources_Count
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  criteria → FilteredView (indices, file order)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  summary  │  counts, means, histograms for the charts
///   └──────────┘
/// ```

pub mod codes;
pub mod criteria;
pub mod derive;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;

pub use codes::Sex;
pub use criteria::{DashboardFilters, Range};
pub use derive::{derive, derive_with, MetricGroup};
pub use error::{EmptyResultWarning, ResolveError, SchemaError, UnknownCode};
pub use filter::{filter, Choice, FilterState, FilteredView, Predicate};
pub use model::{FieldValue, StudentDataset, StudentRecord};
