//! # avro2parquet
//!
//! Convert Avro container files into Parquet and preview records from files in
//! either format without loading them into a full processing engine.
//!
//! ## What's inside
//!
//! - **Streaming conversion** - [`convert::convert_avro_to_parquet`] re-encodes
//!   every record from a row-oriented Avro file into a snappy-compressed,
//!   column-chunked Parquet file, one bounded batch at a time.
//! - **Bounded previews** - [`scan::bounded_scan`] runs a two-pass scan over a
//!   (potentially huge) file: pass 1 counts records up to a scan ceiling,
//!   pass 2 re-reads from the start and renders up to a display ceiling. The
//!   report states whether the total is exact (`=`) or a lower bound (`>`).
//! - **Schema access** - [`schema`] parses standalone `.avsc` definitions and
//!   maps Avro schemas onto Arrow fields for the Parquet writer.
//!
//! ## Quick start
//!
//! ```ignore
//! use avro2parquet::{convert::convert_avro_to_parquet, io::avro::AvroScanSource, scan};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let rows = convert_avro_to_parquet("events.avro", "events.parquet")?;
//! println!("wrote {rows} rows");
//!
//! let source = AvroScanSource::new("events.avro");
//! let report = scan::bounded_scan(&source, scan::DEFAULT_RECORDS_TO_READ)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! Both passes of a scan re-open the source from the start instead of
//! buffering, so memory stays bounded regardless of file size. Conversion is a
//! structural re-encoding only: no schema transformation, filtering, or
//! validation happens along the way.

pub mod convert;
pub mod io;
pub mod scan;
pub mod schema;

pub use convert::convert_avro_to_parquet;
pub use scan::{bounded_scan, DEFAULT_RECORDS_TO_READ, MAX_COUNT_TO_DISPLAY, MAX_COUNT_TO_SCAN};
