//! Avro schema access and Avro-to-Arrow schema mapping.
//!
//! This module provides:
//! - [`parse_avsc_file`] to parse a standalone `.avsc` schema definition
//! - [`to_arrow_fields`] to map a top-level Avro record schema onto the Arrow
//!   fields the Parquet writer is configured with
//!
//! Parsing is stateless: every call builds a fresh [`Schema`], there is no
//! shared parser instance. The schema embedded in an Avro container file is
//! read through `apache_avro::Reader::writer_schema` and needs no wrapper here.

use anyhow::{bail, Context, Result};
use apache_avro::schema::Schema;
use arrow::datatypes::{DataType, Field, FieldRef, Fields};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Parse a standalone Avro schema definition (`.avsc`) file.
///
/// # Errors
/// Returns an error if the file cannot be read or does not contain a valid
/// Avro schema.
pub fn parse_avsc_file(path: impl AsRef<Path>) -> Result<Schema> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("read schema definition {}", path.display()))?;
    Schema::parse_str(&text)
        .with_context(|| format!("parse schema definition {}", path.display()))
}

/// Map a top-level Avro record schema onto Arrow fields, one per record field,
/// in declaration order.
///
/// Primitives map 1:1, logical types map to their underlying primitive
/// representation, `bytes`/`fixed` become `Binary`, `enum` and `uuid` become
/// `Utf8`, two-branch unions with `null` become a nullable field, arrays
/// become `List`, maps become `Map`, and nested records become `Struct`
/// (recursively).
///
/// # Errors
/// Returns an error if the top-level schema is not a record, or if any field
/// uses a shape with no direct columnar equivalent: a union with more than one
/// non-null branch, `decimal`, `duration`, or a named-type reference.
pub fn to_arrow_fields(schema: &Schema) -> Result<Vec<FieldRef>> {
    let Schema::Record(record) = schema else {
        bail!("top-level avro schema must be a record, got {schema:?}");
    };
    record
        .fields
        .iter()
        .map(|f| {
            let (data_type, nullable) = arrow_type(&f.schema)
                .with_context(|| format!("map avro field `{}`", f.name))?;
            Ok(Arc::new(Field::new(&f.name, data_type, nullable)))
        })
        .collect()
}

fn arrow_type(schema: &Schema) -> Result<(DataType, bool)> {
    let data_type = match schema {
        Schema::Null => DataType::Null,
        Schema::Boolean => DataType::Boolean,
        Schema::Int | Schema::Date | Schema::TimeMillis => DataType::Int32,
        Schema::Long
        | Schema::TimeMicros
        | Schema::TimestampMillis
        | Schema::TimestampMicros
        | Schema::TimestampNanos
        | Schema::LocalTimestampMillis
        | Schema::LocalTimestampMicros
        | Schema::LocalTimestampNanos => DataType::Int64,
        Schema::Float => DataType::Float32,
        Schema::Double => DataType::Float64,
        Schema::Bytes | Schema::Fixed(_) => DataType::Binary,
        Schema::String | Schema::Enum(_) | Schema::Uuid => DataType::Utf8,
        Schema::Array(array) => {
            let (item_type, item_nullable) = arrow_type(&array.items)?;
            DataType::List(Arc::new(Field::new("element", item_type, item_nullable)))
        }
        Schema::Map(map) => {
            let (value_type, value_nullable) = arrow_type(&map.types)?;
            let entries = Field::new(
                "entries",
                DataType::Struct(Fields::from(vec![
                    Field::new("key", DataType::Utf8, false),
                    Field::new("value", value_type, value_nullable),
                ])),
                false,
            );
            DataType::Map(Arc::new(entries), false)
        }
        Schema::Record(record) => {
            let fields = record
                .fields
                .iter()
                .map(|f| {
                    let (data_type, nullable) = arrow_type(&f.schema)
                        .with_context(|| format!("map avro field `{}`", f.name))?;
                    Ok(Field::new(&f.name, data_type, nullable))
                })
                .collect::<Result<Vec<_>>>()?;
            DataType::Struct(Fields::from(fields))
        }
        Schema::Union(union) => return union_type(union.variants()),
        other => bail!("avro type {other:?} has no columnar equivalent"),
    };
    Ok((data_type, false))
}

// A union is only representable as a column when it is `null` plus at most one
// concrete branch; anything else would need a tagged encoding we do not write.
fn union_type(variants: &[Schema]) -> Result<(DataType, bool)> {
    let concrete: Vec<&Schema> = variants
        .iter()
        .filter(|v| !matches!(v, Schema::Null))
        .collect();
    let has_null = concrete.len() < variants.len();
    match concrete.as_slice() {
        [] => Ok((DataType::Null, true)),
        [single] => {
            let (data_type, inner_nullable) = arrow_type(single)?;
            Ok((data_type, has_null || inner_nullable))
        }
        _ => bail!("unions with more than one non-null branch are not supported"),
    }
}
