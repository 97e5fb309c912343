//! `avro2parquet` CLI entry point.
//!
//! Thin glue over the library: parses one subcommand, validates its
//! arguments, and dispatches to conversion or a bounded scan. Scan reports go
//! to stdout; diagnostics go through `tracing` on stderr.

use anyhow::{bail, Result};
use avro2parquet::convert::convert_avro_to_parquet;
use avro2parquet::io::avro::AvroScanSource;
use avro2parquet::io::parquet::ParquetScanSource;
use avro2parquet::scan::{bounded_scan, ScanSource, DEFAULT_RECORDS_TO_READ};
use avro2parquet::schema::parse_avsc_file;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avro2parquet", version, about = "Convert Avro files to Parquet and preview records from either format")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an Avro container file into a Parquet file.
    Convert {
        /// Input Avro file.
        #[arg(long)]
        avro: PathBuf,
        /// Output Parquet file; defaults to `<avro>.parquet`.
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
    /// Print the schema and a bounded preview of an Avro file.
    ReadAvro {
        /// Input Avro file.
        #[arg(long)]
        avro: PathBuf,
        /// Number of records to read.
        #[arg(long, default_value_t = DEFAULT_RECORDS_TO_READ, value_parser = clap::value_parser!(u64).range(1..))]
        num: u64,
    },
    /// Print the schema and a bounded preview of a Parquet file.
    ReadParquet {
        /// Input Parquet file.
        #[arg(long)]
        parquet: PathBuf,
        /// Number of records to read.
        #[arg(long, default_value_t = DEFAULT_RECORDS_TO_READ, value_parser = clap::value_parser!(u64).range(1..))]
        num: u64,
    },
    /// Convert newline-delimited JSON into Avro using a schema definition.
    Json2avro {
        /// Input JSON file.
        #[arg(long)]
        json: PathBuf,
        /// Avro schema definition (.avsc) file.
        #[arg(long)]
        avsc: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Convert { avro, parquet } => {
            tracing::info!("action is avro2parquet");
            let parquet = parquet.unwrap_or_else(|| {
                let default = PathBuf::from(format!("{}.parquet", avro.display()));
                tracing::warn!(
                    output = %default.display(),
                    "parquet output file path is missing, using default"
                );
                default
            });
            tracing::info!(avro = %avro.display(), parquet = %parquet.display(), "converting");
            let rows = convert_avro_to_parquet(&avro, &parquet)?;
            tracing::info!(rows, "done");
        }
        Command::ReadAvro { avro, num } => {
            tracing::info!(avro = %avro.display(), num, "action is read-avro");
            print_scan(&AvroScanSource::new(avro), num)?;
        }
        Command::ReadParquet { parquet, num } => {
            tracing::info!(parquet = %parquet.display(), num, "action is read-parquet");
            print_scan(&ParquetScanSource::new(parquet), num)?;
        }
        Command::Json2avro { json, avsc } => {
            let schema = parse_avsc_file(&avsc)?;
            tracing::info!(
                json = %json.display(),
                schema = %schema.canonical_form(),
                "action is json2avro"
            );
            bail!("json2avro conversion is not implemented yet");
        }
    }
    Ok(())
}

fn print_scan(source: &dyn ScanSource, num: u64) -> Result<()> {
    let report = bounded_scan(source, num)?;
    print!("{report}");
    Ok(())
}
