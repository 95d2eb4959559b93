//! Data loading module
//!
//! Reads historical close series from Parquet files

mod parquet;

pub use self::parquet::{ParquetReader, DEFAULT_CLOSE_COLUMN};
