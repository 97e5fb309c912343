//! Column-oriented scan source backed by a Parquet file.
//!
//! This module provides:
//! - [`ParquetScanSource`], the [`ScanSource`] for Parquet files: the counting
//!   pass sums row counts straight from row-group metadata without decoding a
//!   single page, and the rendering pass streams record batches of bounded
//!   size
//! - The tabular renderer: [`header_line`] and [`row_line`], which join field
//!   names and stringified values with ` | ` and hide nested values behind
//!   [`COMPLEX_VALUE_PLACEHOLDER`]
//!
//! # Design notes
//! - A null top-level value contributes no token at all (repetition count 0),
//!   a repeated primitive contributes one token per element, and any nested
//!   value contributes the placeholder once per repetition.
//! - Whether a value renders or hides is a closed match on the Arrow
//!   `DataType`; there is no per-value dynamic dispatch.

use crate::scan::ScanSource;
use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ListArray, MapArray, RecordBatch};
use arrow::datatypes::{DataType, Schema as ArrowSchema};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::schema::printer::print_schema;
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Stand-in token for any value too structured to print inline.
pub const COMPLEX_VALUE_PLACEHOLDER: &str = "(complex data type hidden...)";

/// Rows decoded per record batch during the rendering pass.
const READ_BATCH_ROWS: usize = 1024;

/// A re-openable Parquet file.
pub struct ParquetScanSource {
    path: PathBuf,
}

impl ParquetScanSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open_file(&self) -> Result<File> {
        File::open(&self.path).with_context(|| format!("open {}", self.path.display()))
    }
}

impl ScanSource for ParquetScanSource {
    fn format_name(&self) -> &'static str {
        "parquet"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn schema_text(&self) -> Result<String> {
        let reader = SerializedFileReader::new(self.open_file()?)
            .with_context(|| format!("read parquet footer of {}", self.path.display()))?;
        let mut out = Vec::new();
        print_schema(&mut out, reader.metadata().file_metadata().schema());
        let text = String::from_utf8(out).context("format parquet schema")?;
        Ok(text.trim_end().to_string())
    }

    fn counts(&self) -> Result<Box<dyn Iterator<Item = Result<u64>>>> {
        // Row-group metadata already stores exact row counts, so the counting
        // pass never touches page data.
        let reader = SerializedFileReader::new(self.open_file()?)
            .with_context(|| format!("read parquet footer of {}", self.path.display()))?;
        let meta = reader.metadata();
        let group_rows: Vec<u64> = (0..meta.num_row_groups())
            .map(|i| meta.row_group(i).num_rows().cast_unsigned())
            .collect();
        Ok(Box::new(group_rows.into_iter().map(Ok)))
    }

    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<String>>>> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.open_file()?)
            .with_context(|| format!("read parquet footer of {}", self.path.display()))?;
        let reader = builder
            .with_batch_size(READ_BATCH_ROWS)
            .build()
            .with_context(|| format!("open parquet reader for {}", self.path.display()))?;
        Ok(Box::new(RowLines {
            reader,
            pending: VecDeque::new(),
            failed: false,
        }))
    }

    fn header(&self) -> Result<Option<String>> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(self.open_file()?)
            .with_context(|| format!("read parquet footer of {}", self.path.display()))?;
        Ok(Some(header_line(builder.schema())))
    }
}

/// Streams record batches and hands out one rendered line per logical row.
struct RowLines {
    reader: ParquetRecordBatchReader,
    pending: VecDeque<String>,
    failed: bool,
}

impl Iterator for RowLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.failed {
                return None;
            }
            match self.reader.next() {
                None => return None,
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(
                        anyhow!(err).context("decode parquet record batch")
                    ));
                }
                Some(Ok(batch)) => {
                    for row in 0..batch.num_rows() {
                        match row_line(&batch, row) {
                            Ok(line) => self.pending.push_back(line),
                            Err(err) => {
                                self.failed = true;
                                return Some(Err(err));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Tabular header: the top-level field names joined with ` | `.
pub fn header_line(schema: &ArrowSchema) -> String {
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    names.join(" | ")
}

/// Render one logical row: per top-level field in declaration order, one token
/// per repetition, joined with ` | `. Primitive values stringify; nested
/// values render as [`COMPLEX_VALUE_PLACEHOLDER`]; nulls contribute nothing.
///
/// # Errors
/// Returns an error if a column cannot be formatted or has an unexpected
/// physical layout.
pub fn row_line(batch: &RecordBatch, row: usize) -> Result<String> {
    let options = FormatOptions::default();
    let mut tokens: Vec<String> = Vec::new();
    for (field, column) in batch.schema_ref().fields().iter().zip(batch.columns()) {
        if column.is_null(row) {
            continue;
        }
        match field.data_type() {
            data_type if !data_type.is_nested() => {
                let formatter = ArrayFormatter::try_new(column.as_ref(), &options)
                    .with_context(|| format!("format column `{}`", field.name()))?;
                let token = formatter
                    .value(row)
                    .try_to_string()
                    .with_context(|| format!("format column `{}`", field.name()))?;
                tokens.push(token);
            }
            DataType::List(element) if !element.data_type().is_nested() => {
                let list = column
                    .as_any()
                    .downcast_ref::<ListArray>()
                    .ok_or_else(|| anyhow!("column `{}` is not a list array", field.name()))?;
                let values = list.value(row);
                let formatter = ArrayFormatter::try_new(values.as_ref(), &options)
                    .with_context(|| format!("format column `{}`", field.name()))?;
                for index in 0..values.len() {
                    if values.is_null(index) {
                        continue;
                    }
                    let token = formatter
                        .value(index)
                        .try_to_string()
                        .with_context(|| format!("format column `{}`", field.name()))?;
                    tokens.push(token);
                }
            }
            DataType::List(_) => {
                let list = column
                    .as_any()
                    .downcast_ref::<ListArray>()
                    .ok_or_else(|| anyhow!("column `{}` is not a list array", field.name()))?;
                for _ in 0..list.value_length(row) {
                    tokens.push(COMPLEX_VALUE_PLACEHOLDER.to_string());
                }
            }
            DataType::Map(..) => {
                let map = column
                    .as_any()
                    .downcast_ref::<MapArray>()
                    .ok_or_else(|| anyhow!("column `{}` is not a map array", field.name()))?;
                for _ in 0..map.value_length(row) {
                    tokens.push(COMPLEX_VALUE_PLACEHOLDER.to_string());
                }
            }
            // Structs and any other nested layout: present once, hidden.
            _ => tokens.push(COMPLEX_VALUE_PLACEHOLDER.to_string()),
        }
    }
    Ok(tokens.join(" | "))
}
