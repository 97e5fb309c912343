//! Shared fixtures: tiny Avro files written through `apache-avro` directly.
#![allow(dead_code)]

use anyhow::Result;
use apache_avro::types::Record;
use apache_avro::{Schema, Writer};
use std::fs::File;
use std::path::Path;

/// `{id: long, name: string}` - the smallest useful record shape.
pub const PERSON_SCHEMA: &str = r#"{
    "type": "record",
    "name": "person",
    "fields": [
        {"name": "id", "type": "long"},
        {"name": "name", "type": "string"}
    ]
}"#;

/// Write one `person` record per `(id, name)` pair.
pub fn write_people(path: &Path, rows: &[(i64, &str)]) -> Result<()> {
    let schema = Schema::parse_str(PERSON_SCHEMA)?;
    let mut writer = Writer::new(&schema, File::create(path)?);
    for (id, name) in rows {
        let mut record = Record::new(&schema).expect("person schema is a record");
        record.put("id", *id);
        record.put("name", *name);
        writer.append(record)?;
    }
    // into_inner also writes the container header when no record was appended
    writer.into_inner()?;
    Ok(())
}

/// Write records of an arbitrary schema from pre-built Avro values.
pub fn write_values(
    path: &Path,
    schema_json: &str,
    rows: Vec<apache_avro::types::Value>,
) -> Result<()> {
    let schema = Schema::parse_str(schema_json)?;
    let mut writer = Writer::new(&schema, File::create(path)?);
    for row in rows {
        writer.append(row)?;
    }
    writer.into_inner()?;
    Ok(())
}
