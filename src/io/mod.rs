pub mod avro;
pub mod parquet;
