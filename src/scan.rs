//! Bounded two-pass scanning over huge files.
//!
//! This module provides:
//! - **Safety limits**: [`MAX_COUNT_TO_SCAN`], [`MAX_COUNT_TO_DISPLAY`], and
//!   [`DEFAULT_RECORDS_TO_READ`]
//! - **Source abstraction**: [`ScanSource`], a re-openable record source that
//!   both file formats implement
//! - **The scan itself**: [`bounded_scan`], which counts in pass 1 and renders
//!   in pass 2, never buffering more than one record
//!
//! # Design notes
//! - Sources expose only forward iteration, so pass 2 re-opens the source from
//!   the start instead of buffering pass 1's results.
//! - Pass 1 consumes **batch counts** rather than individual items: the Avro
//!   source yields `1` per decoded record, while the Parquet source yields one
//!   count per row group straight from file metadata, without decoding pages.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Hard cap on items counted in pass 1; past this the reported total becomes
/// a lower bound. Ten million, otherwise the counting pass is too slow on
/// pathologically large files.
pub const MAX_COUNT_TO_SCAN: u64 = 10_000_000;

/// Hard cap on records rendered in pass 2, keeping the report small enough to
/// fit in an HTTP reply regardless of how much was scanned.
pub const MAX_COUNT_TO_DISPLAY: u64 = 1_000;

/// Number of records a scan renders when the caller does not ask for a count.
pub const DEFAULT_RECORDS_TO_READ: u64 = 10;

/// A record source that can be enumerated from the start repeatedly.
///
/// Both passes of [`bounded_scan`] open a fresh iterator, so implementations
/// must be able to re-read the underlying file from offset 0. Returned
/// iterators own their file handles; dropping the iterator releases them.
pub trait ScanSource {
    /// Short format label used in the report banners (`"avro"`, `"parquet"`).
    fn format_name(&self) -> &'static str;

    /// Path of the underlying file, echoed in the report banners.
    fn path(&self) -> &Path;

    /// Schema description printed between the schema banners.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its schema read.
    fn schema_text(&self) -> Result<String>;

    /// Open the counting pass: an iterator of per-batch record counts.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened.
    fn counts(&self) -> Result<Box<dyn Iterator<Item = Result<u64>>>>;

    /// Open the rendering pass: an iterator of stringified records, one per
    /// logical row, in file order.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened.
    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<String>>>>;

    /// Header line emitted once before the first rendered record, if the
    /// format has one (field names for Parquet, nothing for Avro).
    ///
    /// # Errors
    /// Returns an error if the schema needed to build the header cannot be read.
    fn header(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Scan `source` twice and produce a bounded text report.
///
/// Pass 1 counts records until the source is exhausted or the running total
/// exceeds [`MAX_COUNT_TO_SCAN`]; the report's sentinel is `=` when the total
/// is exact and `>` when the ceiling cut the count short. Pass 2 re-opens the
/// source and renders records numbered from 1 until
/// `min(requested, MAX_COUNT_TO_DISPLAY)` records have been rendered, then
/// emits a marker stating how many records were skipped.
///
/// `requested` must be positive; the CLI enforces this before calling in, and
/// a zero here is rejected again as a precondition violation.
///
/// # Errors
/// Returns an error if `requested` is zero or if reading the source fails in
/// either pass. No partial report is returned on failure.
pub fn bounded_scan(source: &dyn ScanSource, requested: u64) -> Result<String> {
    if requested == 0 {
        bail!("# of records to read must be positive");
    }

    let format = source.format_name();
    let path = source.path().display().to_string();

    let mut buf = String::new();
    buf.push_str(&format!(">>> {format} schema of {path} >>>\n"));
    buf.push_str(&source.schema_text()?);
    buf.push('\n');
    buf.push_str(&format!("<<< {format} schema of {path} <<<\n"));

    // Pass 1: count up to the scan ceiling.
    let mut total: u64 = 0;
    let mut all_scanned = true;
    for batch in source.counts()? {
        let n = batch.with_context(|| format!("count records in {path}"))?;
        total += n;
        if total > MAX_COUNT_TO_SCAN {
            all_scanned = false;
            break;
        }
    }

    let sentinel = if all_scanned { "=" } else { ">" };
    buf.push_str(&format!(
        ">>> list of records, total count {sentinel} {total}, # of records to read: {requested} >>>\n"
    ));

    // Pass 2: re-open and render up to the display cap.
    let cap = requested.min(MAX_COUNT_TO_DISPLAY);
    let mut rendered: u64 = 0;
    let mut header_emitted = false;
    for row in source.rows()? {
        let row = row.with_context(|| format!("read record from {path}"))?;
        if rendered >= cap {
            let prefix = if all_scanned { "" } else { "more than " };
            let skipped = total - rendered;
            buf.push_str(&format!("({prefix}{skipped} records have been skipped...)\n"));
            break;
        }
        if !header_emitted {
            if let Some(header) = source.header()? {
                buf.push_str(&header);
                buf.push('\n');
            }
            header_emitted = true;
        }
        rendered += 1;
        buf.push_str(&format!("{rendered}) {row}\n"));
    }

    buf.push_str(&format!(
        "<<< list of records, total count {sentinel} {total}, # of records to read: {requested} <<<\n"
    ));
    Ok(buf)
}
