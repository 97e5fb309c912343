mod common;

use anyhow::Result;
use apache_avro::types::Value;
use arrow::array::{Array, Float64Array, Int64Array, RecordBatch, StringArray, StructArray};
use arrow::datatypes::DataType;
use avro2parquet::convert::convert_avro_to_parquet;
use common::{write_people, write_values};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

fn read_all(path: &Path) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    Ok(reader.collect::<Result<Vec<_>, _>>()?)
}

#[test]
fn round_trip_primitives() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("people.avro");
    let parquet = tmp.path().join("people.parquet");
    write_people(&avro, &[(1, "a"), (2, "b"), (3, "c")])?;

    let rows = convert_avro_to_parquet(&avro, &parquet)?;
    assert_eq!(rows, 3);

    let batches = read_all(&parquet)?;
    let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(total, 3);

    let batch = &batches[0];
    let names: Vec<&str> = batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names, ["id", "name"]);

    let ids = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("id column is Int64");
    let ids: Vec<i64> = (0..ids.len()).map(|i| ids.value(i)).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let labels = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("name column is Utf8");
    assert_eq!(labels.value(0), "a");
    assert_eq!(labels.value(2), "c");
    Ok(())
}

#[test]
fn nullable_union_becomes_nullable_column() -> Result<()> {
    let schema = r#"{
        "type": "record",
        "name": "scored",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "score", "type": ["null", "double"]}
        ]
    }"#;
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("scored.avro");
    let parquet = tmp.path().join("scored.parquet");
    write_values(
        &avro,
        schema,
        vec![
            Value::Record(vec![
                ("id".into(), Value::Long(1)),
                ("score".into(), Value::Union(1, Box::new(Value::Double(1.5)))),
            ]),
            Value::Record(vec![
                ("id".into(), Value::Long(2)),
                ("score".into(), Value::Union(0, Box::new(Value::Null))),
            ]),
        ],
    )?;

    assert_eq!(convert_avro_to_parquet(&avro, &parquet)?, 2);

    let batches = read_all(&parquet)?;
    let scores = batches[0]
        .column(1)
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("score column is Float64");
    assert_eq!(scores.value(0), 1.5);
    assert!(scores.is_null(1));
    Ok(())
}

#[test]
fn nested_record_becomes_struct_column() -> Result<()> {
    let schema = r#"{
        "type": "record",
        "name": "outer",
        "fields": [
            {"name": "id", "type": "long"},
            {"name": "inner", "type": {
                "type": "record",
                "name": "inner",
                "fields": [{"name": "x", "type": "long"}]
            }}
        ]
    }"#;
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("nested.avro");
    let parquet = tmp.path().join("nested.parquet");
    write_values(
        &avro,
        schema,
        vec![Value::Record(vec![
            ("id".into(), Value::Long(9)),
            (
                "inner".into(),
                Value::Record(vec![("x".into(), Value::Long(42))]),
            ),
        ])],
    )?;

    assert_eq!(convert_avro_to_parquet(&avro, &parquet)?, 1);

    let batches = read_all(&parquet)?;
    let inner_field = batches[0].schema_ref().field(1).clone();
    assert!(matches!(inner_field.data_type(), DataType::Struct(_)));
    let inner = batches[0]
        .column(1)
        .as_any()
        .downcast_ref::<StructArray>()
        .expect("inner column is a struct");
    let xs = inner
        .column_by_name("x")
        .expect("x member")
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("x is Int64");
    assert_eq!(xs.value(0), 42);
    Ok(())
}

#[test]
fn empty_source_writes_empty_parquet() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("empty.avro");
    let parquet = tmp.path().join("empty.parquet");
    write_people(&avro, &[])?;

    assert_eq!(convert_avro_to_parquet(&avro, &parquet)?, 0);

    let batches = read_all(&parquet)?;
    let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(total, 0);
    Ok(())
}

#[test]
fn missing_source_fails_with_open_context() {
    let tmp = tempfile::tempdir().unwrap();
    let err = convert_avro_to_parquet(
        tmp.path().join("absent.avro"),
        tmp.path().join("out.parquet"),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("open"));
}

#[test]
fn unwritable_output_fails_and_source_is_released() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("people.avro");
    write_people(&avro, &[(1, "a")])?;

    let err = convert_avro_to_parquet(&avro, tmp.path().join("no-such-dir/out.parquet"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("create"));

    // The source handle is back: the same file converts fine afterwards.
    let parquet = tmp.path().join("ok.parquet");
    assert_eq!(convert_avro_to_parquet(&avro, &parquet)?, 1);
    Ok(())
}

#[test]
fn rejects_schema_without_columnar_mapping() -> Result<()> {
    let schema = r#"{
        "type": "record",
        "name": "mixed",
        "fields": [
            {"name": "v", "type": ["long", "string"]}
        ]
    }"#;
    let tmp = tempfile::tempdir()?;
    let avro = tmp.path().join("mixed.avro");
    write_values(
        &avro,
        schema,
        vec![Value::Record(vec![(
            "v".into(),
            Value::Union(0, Box::new(Value::Long(1))),
        )])],
    )?;

    let err = convert_avro_to_parquet(&avro, tmp.path().join("mixed.parquet")).unwrap_err();
    assert!(format!("{err:#}").contains("union"));
    Ok(())
}
