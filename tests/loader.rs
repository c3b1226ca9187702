use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Date32Array, DictionaryArray, Float64Array, Int64Array, StringArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Int32Type, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use timss_explorer::data::derive::{derive, derive_with, standard_groups, MetricGroup, MATH_AVG};
use timss_explorer::data::loader::load_file;
use timss_explorer::data::{filter, FieldValue, FilterState, Predicate, ResolveError, Sex};

fn batch() -> RecordBatch {
    let mut fields = vec![
        Field::new("IDSTUD", DataType::Int64, false),
        Field::new("ITSEX", DataType::Float64, true),
        Field::new("LANG", DataType::Utf8, true),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![11, 12, 13])),
        Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0), None])),
        Arc::new(StringArray::from(vec![Some("eng"), None, Some("nor")])),
    ];
    for pv in 1..=5 {
        fields.push(Field::new(format!("BSMMAT{pv:02}"), DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(vec![
            400.0 + pv as f64,
            500.0,
            f64::from(pv) * 100.0,
        ])));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
}

fn check_loaded(path: &Path) {
    let ds = load_file(path).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.records[0].get("IDSTUD"), Some(&FieldValue::Integer(11)));
    assert_eq!(ds.records[0].get("ITSEX"), Some(&FieldValue::Sex(Sex::Female)));
    assert_eq!(ds.records[1].get("ITSEX"), Some(&FieldValue::Sex(Sex::Male)));
    assert_eq!(ds.records[2].get("ITSEX"), Some(&FieldValue::Null));

    let math = [MetricGroup::plausible_values(MATH_AVG, "BSMMAT")];
    let ds = derive_with(ds, &math).unwrap();
    let avgs: Vec<f64> = ds
        .records
        .iter()
        .map(|r| r.get(MATH_AVG).and_then(FieldValue::as_f64).unwrap())
        .collect();
    assert_eq!(avgs, vec![403.0, 500.0, 300.0]);
}

#[test]
fn feather_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned_data.feather");
    let batch = batch();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = FileWriter::try_new(file, &batch.schema()).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();

    check_loaded(&path);
}

#[test]
fn parquet_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned_data.parquet");
    let batch = batch();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    check_loaded(&path);
}

#[test]
fn csv_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned_data.csv");
    std::fs::write(
        &path,
        "IDSTUD,ITSEX,LANG,BSMMAT01,BSMMAT02,BSMMAT03,BSMMAT04,BSMMAT05\n\
         11,1.0,eng,401,402,403,404,405\n\
         12,Male,,500,500,500,500,500\n\
         13,,nor,100,200,300,400,500\n",
    )
    .unwrap();

    check_loaded(&path);
}

#[test]
fn json_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cleaned_data.json");
    let rows = serde_json::json!([
        { "IDSTUD": 11, "ITSEX": 1, "LANG": "eng",
          "BSMMAT01": 401, "BSMMAT02": 402, "BSMMAT03": 403, "BSMMAT04": 404, "BSMMAT05": 405 },
        { "IDSTUD": 12, "ITSEX": "Male", "LANG": null,
          "BSMMAT01": 500, "BSMMAT02": 500, "BSMMAT03": 500, "BSMMAT04": 500, "BSMMAT05": 500 },
        { "IDSTUD": 13, "ITSEX": null, "LANG": "nor",
          "BSMMAT01": 100, "BSMMAT02": 200, "BSMMAT03": 300, "BSMMAT04": 400, "BSMMAT05": 500 }
    ]);
    std::fs::write(&path, rows.to_string()).unwrap();

    check_loaded(&path);
}

#[test]
fn bad_sex_code_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "IDSTUD,ITSEX\n1,1\n2,7\n").unwrap();

    let err = load_file(&path).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("row 1"), "{msg}");
    let resolve = err.downcast_ref::<ResolveError>().unwrap();
    assert_eq!(resolve.row, 1);
    assert_eq!(resolve.source.value, "7");
}

#[test]
fn fractional_text_sex_code_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"[{"IDSTUD": 1, "ITSEX": "2"}, {"IDSTUD": 2, "ITSEX": "2.5"}]"#).unwrap();

    let err = load_file(&path).unwrap_err();
    let resolve = err.downcast_ref::<ResolveError>().unwrap();
    assert_eq!(resolve.row, 1);
    assert_eq!(resolve.source.value, "2.5");
}

fn full_schema() -> Schema {
    let mut fields = vec![
        Field::new("IDSCHOOL", DataType::Int64, false),
        Field::new("IDSTUD", DataType::Int64, false),
        Field::new("ITSEX", DataType::Int64, true),
        Field::new("BSDAGE", DataType::Float64, true),
    ];
    fields.extend(
        standard_groups()
            .into_iter()
            .flat_map(|g| g.columns)
            .map(|c| Field::new(c, DataType::Float64, true)),
    );
    Schema::new(fields)
}

#[test]
fn zero_row_feather_keeps_its_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.feather");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = FileWriter::try_new(file, &full_schema()).unwrap();
    writer.finish().unwrap();

    let ds = load_file(&path).unwrap();
    assert!(ds.is_empty());
    assert!(ds.has_column("BSDAGE"));

    let ds = derive(ds).unwrap();
    assert!(ds.has_column(MATH_AVG));
    let criteria = FilterState::from([
        ("BSDAGE".to_string(), Predicate::between(10.0, 12.0)),
        (MATH_AVG.to_string(), Predicate::between(0.0, 1000.0)),
    ]);
    let view = filter(&ds, &criteria).unwrap();
    assert!(view.is_empty());
}

#[test]
fn header_only_csv_keeps_its_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let header: Vec<String> = full_schema().fields().iter().map(|f| f.name().clone()).collect();
    std::fs::write(&path, format!("{}\n", header.join(","))).unwrap();

    let ds = derive(load_file(&path).unwrap()).unwrap();
    assert!(ds.is_empty());
    assert!(ds.has_column("IDSCHOOL"));
    assert!(ds.has_column(MATH_AVG));
}

#[test]
fn feather_with_dictionary_unsigned_and_date_columns_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.feather");
    let langs: DictionaryArray<Int32Type> = vec!["eng", "nor", "eng"].into_iter().collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(vec![500101, 500102, 500103])),
        Arc::new(langs),
        Arc::new(Date32Array::from(vec![19723, 19724, 19723])),
    ];
    let schema = Schema::new(vec![
        Field::new("IDSTUD", DataType::UInt64, false),
        Field::new(
            "LANG",
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
            false,
        ),
        Field::new("ADMIN", DataType::Date32, false),
    ]);
    let batch = RecordBatch::try_new(Arc::new(schema), columns).unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = FileWriter::try_new(file, &batch.schema()).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();

    let ds = load_file(&path).unwrap();
    assert_eq!(ds.records[1].get("IDSTUD"), Some(&FieldValue::Integer(500102)));
    assert_eq!(ds.records[1].get("LANG"), Some(&FieldValue::Text("nor".into())));
    assert_eq!(ds.records[2].get("LANG"), Some(&FieldValue::Text("eng".into())));
    assert_eq!(ds.records[0].get("ADMIN"), Some(&FieldValue::Text("2024-01-01".into())));
    assert_eq!(ds.unique_values["ADMIN"].len(), 2);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.feather");
    let err = load_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.feather"));
}
