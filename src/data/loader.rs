use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::codes::{resolve_sex, SEX_COLUMN};
use super::model::{FieldValue, StudentDataset, StudentRecord};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a student dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.feather` / `.arrow` / `.ipc` – Arrow IPC file, as written by `df.to_feather()`
/// * `.parquet` / `.pq`            – Parquet file
/// * `.json`                       – `[{ "IDSTUD": ..., "BSDAGE": ..., ... }, ...]`
/// * `.csv`                        – header row with column names
///
/// The sex code column is resolved to [`FieldValue::Sex`] before returning.
/// Columns declared by the file's schema or header are kept even with zero rows.
pub fn load_file(path: &Path) -> Result<StudentDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut table = match ext.as_str() {
        "feather" | "arrow" | "ipc" => load_feather(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    resolve_sex(&mut table.records)
        .with_context(|| format!("resolving {SEX_COLUMN} in {}", path.display()))?;

    let dataset = StudentDataset::with_columns(table.columns, table.records);
    log::info!(
        "Loaded {} records with {} columns from {}",
        dataset.len(),
        dataset.column_names.len(),
        path.display()
    );
    Ok(dataset)
}

/// Rows as read, plus every column name the source declares.
#[derive(Debug, Default)]
pub(crate) struct RawTable {
    pub columns: BTreeSet<String>,
    pub records: Vec<StudentRecord>,
}

impl RawTable {
    fn with_columns<I: IntoIterator<Item = String>>(columns: I) -> Self {
        RawTable {
            columns: columns.into_iter().collect(),
            records: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "IDSCHOOL": 5001, "IDSTUD": 500101, "ITSEX": 1, "BSDAGE": 13.8, ... },
///   ...
/// ]
/// ```
///
/// The column set is the union of every object's keys.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut table = RawTable::default();
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        table.columns.extend(obj.keys().cloned());
        table.records.push(StudentRecord {
            fields: obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_field(val)))
                .collect(),
        });
    }
    Ok(table)
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Integer(i64::from(*b)),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one student per line.
/// Cell types are guessed per cell; empty cells become null.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::with_columns(headers.iter().cloned());
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let fields: BTreeMap<String, FieldValue> = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| (name.clone(), guess_field_type(cell)))
            .collect();
        table.records.push(StudentRecord { fields });
    }
    Ok(table)
}

fn guess_field_type(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Integer(i64::from(s == "true"));
    }
    FieldValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Feather (Arrow IPC) loader
// ---------------------------------------------------------------------------

/// Load a Feather v2 file. Compressed buffers (lz4, zstd) are supported.
fn load_feather(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening feather file")?;
    let reader = FileReader::try_new(file, None).context("reading feather footer")?;

    let mut table =
        RawTable::with_columns(reader.schema().fields().iter().map(|f| f.name().clone()));
    for batch_result in reader {
        let batch = batch_result.context("reading feather record batch")?;
        append_batch(&batch, &mut table)?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file; works with files written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let mut table =
        RawTable::with_columns(builder.schema().fields().iter().map(|f| f.name().clone()));
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        append_batch(&batch, &mut table)?;
    }
    Ok(table)
}

// -- Arrow helpers --

/// Convert every row of a record batch into a [`StudentRecord`].
///
/// Each column is brought to a type [`extract_field_value`] reads directly
/// once per batch, before the row loop.
pub(crate) fn append_batch(batch: &RecordBatch, table: &mut RawTable) -> Result<()> {
    let schema = batch.schema();
    let start = table.records.len();
    table
        .records
        .extend((0..batch.num_rows()).map(|_| StudentRecord::default()));

    for (col_idx, field) in schema.fields().iter().enumerate() {
        table.columns.insert(field.name().clone());
        let col = normalize_column(batch.column(col_idx))
            .with_context(|| format!("column {}", field.name()))?;
        for row in 0..batch.num_rows() {
            let value = extract_field_value(&col, row)
                .with_context(|| format!("column {}, row {}", field.name(), start + row))?;
            table.records[start + row]
                .fields
                .insert(field.name().clone(), value);
        }
    }
    Ok(())
}

/// Types [`extract_field_value`] reads cell by cell.
fn is_native(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Bring a whole column to a native type.
///
/// Dictionaries unpack to their value type, other numbers (half floats,
/// decimals) widen to `Float64`, anything else becomes its display text.
fn normalize_column(col: &ArrayRef) -> Result<ArrayRef> {
    let dt = col.data_type();
    if is_native(dt) {
        return Ok(Arc::clone(col));
    }

    let target = match dt {
        DataType::Dictionary(_, value) if is_native(value) => value.as_ref().clone(),
        dt if dt.is_numeric() => DataType::Float64,
        _ => DataType::Utf8,
    };
    if can_cast_types(dt, &target) {
        log::debug!("column of type {dt} read as {target}");
        return cast(col, &target).with_context(|| format!("casting {dt} to {target}"));
    }

    log::debug!("column of type {dt} read as display text");
    let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
        .with_context(|| format!("formatting {dt}"))?;
    let text: StringArray = (0..col.len())
        .map(|i| (!col.is_null(i)).then(|| formatter.value(i).to_string()))
        .collect();
    Ok(Arc::new(text))
}

fn float_cell(v: f64) -> FieldValue {
    if v.is_nan() {
        FieldValue::Null
    } else {
        FieldValue::Float(v)
    }
}

/// Extract a single cell from a normalised Arrow column at a given row.
fn extract_field_value(col: &ArrayRef, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => FieldValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => FieldValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => FieldValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => FieldValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => FieldValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => FieldValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => FieldValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => FieldValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => FieldValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or_else(|_| FieldValue::Text(v.to_string()), FieldValue::Integer)
        }
        DataType::Float32 => float_cell(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => float_cell(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => FieldValue::Integer(i64::from(col.as_boolean().value(row))),
        other => bail!("column of type {other} was not normalised"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{
        Date32Array, DictionaryArray, Float16Array, Float64Array, Int32Array, UInt64Array,
    };
    use arrow::datatypes::{Field, Schema};
    use half::f16;

    #[test]
    fn csv_cells_are_typed() {
        assert_eq!(guess_field_type("5001"), FieldValue::Integer(5001));
        assert_eq!(guess_field_type(" 13.75 "), FieldValue::Float(13.75));
        assert_eq!(guess_field_type(""), FieldValue::Null);
        assert_eq!(guess_field_type("NaN"), FieldValue::Null);
        assert_eq!(guess_field_type("Female"), FieldValue::Text("Female".into()));
    }

    #[test]
    fn json_numbers_keep_integer_type() {
        let v: JsonValue = serde_json::json!([1, 2.5, null, "x", true]);
        let cells: Vec<FieldValue> = v.as_array().unwrap().iter().map(json_to_field).collect();
        assert_eq!(
            cells,
            vec![
                FieldValue::Integer(1),
                FieldValue::Float(2.5),
                FieldValue::Null,
                FieldValue::Text("x".into()),
                FieldValue::Integer(1),
            ]
        );
    }

    #[test]
    fn record_batch_rows_become_records() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("IDSTUD", DataType::Int32, false),
            Field::new("BSDAGE", DataType::Float64, true),
            Field::new("LANG", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(Float64Array::from(vec![Some(13.5), None])),
                Arc::new(StringArray::from(vec![Some("en"), None])),
            ],
        )
        .unwrap();

        let mut table = RawTable::default();
        table.records.push(StudentRecord::default());
        append_batch(&batch, &mut table).unwrap();
        assert_eq!(table.records.len(), 3);
        assert_eq!(table.records[1].get("IDSTUD"), Some(&FieldValue::Integer(1)));
        assert_eq!(table.records[1].get("BSDAGE"), Some(&FieldValue::Float(13.5)));
        assert_eq!(table.records[2].get("BSDAGE"), Some(&FieldValue::Null));
        assert_eq!(table.records[2].get("LANG"), Some(&FieldValue::Null));
        assert_eq!(table.columns.len(), 3);
    }

    fn single_column(name: &str, col: ArrayRef) -> RawTable {
        let schema = Arc::new(Schema::new(vec![Field::new(name, col.data_type().clone(), true)]));
        let batch = RecordBatch::try_new(schema, vec![col]).unwrap();
        let mut table = RawTable::default();
        append_batch(&batch, &mut table).unwrap();
        table
    }

    fn cells(table: &RawTable, name: &str) -> Vec<FieldValue> {
        table
            .records
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or(FieldValue::Null))
            .collect()
    }

    #[test]
    fn unsigned_64_bit_ids_stay_integers() {
        let table = single_column(
            "IDSTUD",
            Arc::new(UInt64Array::from(vec![Some(500101), None, Some(u64::MAX)])),
        );
        assert_eq!(
            cells(&table, "IDSTUD"),
            vec![
                FieldValue::Integer(500101),
                FieldValue::Null,
                FieldValue::Text(u64::MAX.to_string()),
            ]
        );
    }

    #[test]
    fn dates_read_as_their_text() {
        let table = single_column("ADMIN", Arc::new(Date32Array::from(vec![Some(19723), None])));
        assert_eq!(
            cells(&table, "ADMIN"),
            vec![FieldValue::Text("2024-01-01".into()), FieldValue::Null]
        );
    }

    #[test]
    fn dictionary_columns_unpack_to_values() {
        let langs: DictionaryArray<Int32Type> = vec!["eng", "nor", "eng", "eng"].into_iter().collect();
        let table = single_column("LANG", Arc::new(langs));
        let text = |s: &str| FieldValue::Text(s.into());
        assert_eq!(
            cells(&table, "LANG"),
            vec![text("eng"), text("nor"), text("eng"), text("eng")]
        );
    }

    #[test]
    fn half_floats_widen_to_numbers() {
        let col = Float16Array::from(vec![Some(f16::from_f32(1.5)), None]);
        let table = single_column("BSDAGE", Arc::new(col));
        assert_eq!(
            cells(&table, "BSDAGE"),
            vec![FieldValue::Float(1.5), FieldValue::Null]
        );
    }

    #[test]
    fn every_native_type_reads_without_casting() {
        for dt in [DataType::Utf8, DataType::UInt64, DataType::Float32, DataType::Boolean] {
            assert!(is_native(&dt), "{dt}");
        }
        assert!(!is_native(&DataType::Float16));
        assert!(!is_native(&DataType::Date32));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("scores.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
