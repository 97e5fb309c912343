//! Streaming Avro-to-Parquet conversion.
//!
//! This module provides [`convert_avro_to_parquet`], a structural re-encoding
//! of a row-oriented Avro container file into a column-chunked, snappy
//! compressed Parquet file. The target schema is the source's embedded schema
//! mapped through [`crate::schema::to_arrow_fields`]; no values are
//! transformed, filtered, or validated along the way.
//!
//! # Design notes
//! - Records are decoded one at a time and buffered into a fixed-size batch
//!   before hitting the columnar writer, so memory stays bounded by a constant
//!   regardless of file size.
//! - Row groups are flushed once the writer's in-progress size reaches
//!   [`TARGET_BLOCK_SIZE`]; data pages are capped at [`TARGET_PAGE_SIZE`].
//! - The writer close is attempted on every exit path, and a close failure
//!   never masks an earlier read or write failure. The Avro reader is released
//!   by scope, independently of the writer.
//! - On failure the partially written output file is left in place; there is
//!   no atomic rename.

use crate::schema;
use anyhow::{Context, Result};
use apache_avro::types::Value;
use apache_avro::Reader;
use arrow::datatypes::{FieldRef, Schema as ArrowSchema};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::ser::{Error as SerError, SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Target uncompressed row-group size: 256 MiB.
pub const TARGET_BLOCK_SIZE: usize = 256 * 1024 * 1024;

/// Target data-page size: 64 KiB.
pub const TARGET_PAGE_SIZE: usize = 64 * 1024;

/// Records buffered per write into the columnar writer.
const WRITE_BATCH_ROWS: usize = 1024;

/// Convert an Avro container file into a Parquet file, preserving the source
/// schema and record order. Returns the number of rows written.
///
/// # Errors
/// Returns an error if the source cannot be opened or decoded, if its schema
/// has no columnar mapping, if the output cannot be created, or if a write or
/// the final close fails. On failure a partial output file may remain at
/// `parquet_path`.
pub fn convert_avro_to_parquet(
    avro_path: impl AsRef<Path>,
    parquet_path: impl AsRef<Path>,
) -> Result<u64> {
    let avro_path = avro_path.as_ref();
    let parquet_path = parquet_path.as_ref();

    let file =
        File::open(avro_path).with_context(|| format!("open {}", avro_path.display()))?;
    let reader = Reader::new(BufReader::new(file))
        .with_context(|| format!("read avro container header of {}", avro_path.display()))?;
    let avro_schema = reader.writer_schema().clone();
    tracing::info!(schema = %avro_schema.canonical_form(), "avro schema");

    let fields = schema::to_arrow_fields(&avro_schema)
        .with_context(|| format!("map schema of {}", avro_path.display()))?;
    let arrow_schema = Arc::new(ArrowSchema::new(fields.clone()));

    let out = File::create(parquet_path)
        .with_context(|| format!("create {}", parquet_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_data_page_size_limit(TARGET_PAGE_SIZE)
        .build();
    let mut writer = ArrowWriter::try_new(out, arrow_schema, Some(props))
        .with_context(|| format!("open parquet writer for {}", parquet_path.display()))?;

    let streamed = stream_records(reader, &fields, &mut writer);
    let closed = writer
        .close()
        .with_context(|| format!("close parquet writer for {}", parquet_path.display()));
    match (streamed, closed) {
        (Ok(rows), Ok(_)) => {
            tracing::info!(rows, output = %parquet_path.display(), "conversion complete");
            Ok(rows)
        }
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(_)) => Err(err),
        (Err(err), Err(close_err)) => {
            // The streaming failure is the outcome; the close failure is only
            // reported.
            tracing::error!(error = %close_err, "failed to close parquet writer");
            Err(err)
        }
    }
}

fn stream_records<R: Read>(
    reader: Reader<'_, R>,
    fields: &[FieldRef],
    writer: &mut ArrowWriter<File>,
) -> Result<u64> {
    let mut rows: u64 = 0;
    let mut pending: Vec<Value> = Vec::with_capacity(WRITE_BATCH_ROWS);
    for record in reader {
        pending.push(record.context("read avro record")?);
        if pending.len() == WRITE_BATCH_ROWS {
            rows += flush_batch(&mut pending, fields, writer)?;
        }
    }
    if !pending.is_empty() {
        rows += flush_batch(&mut pending, fields, writer)?;
    }
    Ok(rows)
}

fn flush_batch(
    pending: &mut Vec<Value>,
    fields: &[FieldRef],
    writer: &mut ArrowWriter<File>,
) -> Result<u64> {
    let datums: Vec<AvroDatum<'_>> = pending.iter().map(AvroDatum).collect();
    let batch =
        serde_arrow::to_record_batch(fields, &datums).context("encode record batch")?;
    writer.write(&batch).context("write record batch")?;
    if writer.in_progress_size() >= TARGET_BLOCK_SIZE {
        writer.flush().context("flush parquet row group")?;
    }
    let written = pending.len() as u64;
    pending.clear();
    Ok(written)
}

/// One decoded Avro value, serialized the way the Arrow fields from
/// [`schema::to_arrow_fields`] expect: unions collapse to `None`/`Some`,
/// records serialize as maps keyed by field name, `bytes`/`fixed` as bytes,
/// `enum` and `uuid` as strings, and logical types as their underlying
/// primitive.
struct AvroDatum<'a>(&'a Value);

impl Serialize for AvroDatum<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(v) => serializer.serialize_bool(*v),
            Value::Int(v) | Value::Date(v) | Value::TimeMillis(v) => serializer.serialize_i32(*v),
            Value::Long(v)
            | Value::TimeMicros(v)
            | Value::TimestampMillis(v)
            | Value::TimestampMicros(v)
            | Value::TimestampNanos(v)
            | Value::LocalTimestampMillis(v)
            | Value::LocalTimestampMicros(v)
            | Value::LocalTimestampNanos(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Bytes(v) | Value::Fixed(_, v) => serializer.serialize_bytes(v),
            Value::String(v) | Value::Enum(_, v) => serializer.serialize_str(v),
            Value::Uuid(v) => serializer.serialize_str(&v.to_string()),
            Value::Union(_, inner) => match inner.as_ref() {
                Value::Null => serializer.serialize_none(),
                other => serializer.serialize_some(&AvroDatum(other)),
            },
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&AvroDatum(item))?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, &AvroDatum(value))?;
                }
                map.end()
            }
            Value::Record(record_fields) => {
                let mut map = serializer.serialize_map(Some(record_fields.len()))?;
                for (name, value) in record_fields {
                    map.serialize_entry(name, &AvroDatum(value))?;
                }
                map.end()
            }
            other => Err(S::Error::custom(format!(
                "avro value {other:?} has no columnar encoding"
            ))),
        }
    }
}
