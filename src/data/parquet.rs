//! Parquet close-series reader

use crate::backtest::PriceSeries;
use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

/// Column read when none is specified
pub const DEFAULT_CLOSE_COLUMN: &str = "Close";

/// Reader for Parquet files
pub struct ParquetReader {
    path: PathBuf,
}

impl ParquetReader {
    /// Create a new reader for a Parquet file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read one price column as a close series
    ///
    /// Float64, Float32, Int64 and Utf8 (decimal string) columns are
    /// accepted. Null rows are rejected.
    pub fn read_close(&self, column: &str) -> anyhow::Result<PriceSeries> {
        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut close = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;
            let array = batch.column_by_name(column).ok_or_else(|| {
                anyhow::anyhow!("Column {:?} not found in {:?}", column, self.path)
            })?;
            append_prices(array, &mut close)?;
        }

        tracing::debug!(path = ?self.path, column, rows = close.len(), "Read close series from Parquet");

        Ok(PriceSeries::new(close))
    }

    /// Get the file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> anyhow::Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow::anyhow!("Invalid column type {:?}", array.data_type()))
}

fn append_prices(array: &ArrayRef, out: &mut Vec<Decimal>) -> anyhow::Result<()> {
    let offset = out.len();
    let null_at = |i: usize| anyhow::anyhow!("Null close price at row {}", offset + i);

    match array.data_type() {
        DataType::Float64 => {
            for (i, value) in downcast::<Float64Array>(array)?.iter().enumerate() {
                out.push(Decimal::try_from(value.ok_or_else(|| null_at(i))?)?);
            }
        }
        DataType::Float32 => {
            for (i, value) in downcast::<Float32Array>(array)?.iter().enumerate() {
                out.push(Decimal::try_from(value.ok_or_else(|| null_at(i))?)?);
            }
        }
        DataType::Int64 => {
            for (i, value) in downcast::<Int64Array>(array)?.iter().enumerate() {
                out.push(Decimal::from(value.ok_or_else(|| null_at(i))?));
            }
        }
        DataType::Utf8 => {
            for (i, value) in downcast::<StringArray>(array)?.iter().enumerate() {
                out.push(Decimal::from_str(value.ok_or_else(|| null_at(i))?)?);
            }
        }
        other => anyhow::bail!("Unsupported close column type {:?}", other),
    }

    Ok(())
}
