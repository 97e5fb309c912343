//! Row-oriented scan source backed by an Avro container file.
//!
//! Avro readers are forward-only, so each pass of a scan re-opens the file
//! from the start; nothing is buffered between passes. Records render as
//! compact JSON, one line per record.

use crate::scan::ScanSource;
use anyhow::{Context, Result};
use apache_avro::types::Value;
use apache_avro::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A re-openable Avro container file.
pub struct AvroScanSource {
    path: PathBuf,
}

impl AvroScanSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Reader<'static, BufReader<File>>> {
        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        Reader::new(BufReader::new(file))
            .with_context(|| format!("read avro container header of {}", self.path.display()))
    }
}

impl ScanSource for AvroScanSource {
    fn format_name(&self) -> &'static str {
        "avro"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn schema_text(&self) -> Result<String> {
        let reader = self.open()?;
        Ok(reader.writer_schema().canonical_form())
    }

    fn counts(&self) -> Result<Box<dyn Iterator<Item = Result<u64>>>> {
        // Counting still decodes each record; the container format keeps no
        // usable record count in its header.
        let reader = self.open()?;
        Ok(Box::new(reader.map(|record| {
            record.map(|_| 1).context("read avro record")
        })))
    }

    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<String>>>> {
        let reader = self.open()?;
        Ok(Box::new(reader.map(|record| {
            record
                .context("read avro record")
                .and_then(render_record)
        })))
    }
}

fn render_record(record: Value) -> Result<String> {
    let json: serde_json::Value = record
        .try_into()
        .context("render avro record as json")?;
    Ok(json.to_string())
}
