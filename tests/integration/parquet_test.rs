//! Integration tests for Parquet close-series loading

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_decimal_macros::dec;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tick_backtest::backtest::{Backtest, BacktestConfig, PositionMap, PriceSource, SourceMap};
use tick_backtest::data::{ParquetReader, DEFAULT_CLOSE_COLUMN};
use tick_backtest::strategy::HoldStrategy;

fn write_column(path: &Path, name: &str, array: ArrayRef) {
    let schema = Arc::new(Schema::new(vec![Field::new(
        name,
        array.data_type().clone(),
        true,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![array]).unwrap();

    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_read_float_close_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.parquet");
    write_column(
        &path,
        "Close",
        Arc::new(Float64Array::from(vec![100.0, 101.5, 99.25])),
    );

    let series = ParquetReader::new(&path).read_close(DEFAULT_CLOSE_COLUMN).unwrap();
    assert_eq!(series.as_slice(), &[dec!(100), dec!(101.5), dec!(99.25)]);
}

#[test]
fn test_read_string_and_integer_columns() {
    let dir = tempfile::tempdir().unwrap();

    let text = dir.path().join("text.parquet");
    write_column(
        &text,
        "price",
        Arc::new(StringArray::from(vec!["0.1", "0.25"])),
    );
    let series = ParquetReader::new(&text).read_close("price").unwrap();
    assert_eq!(series.as_slice(), &[dec!(0.1), dec!(0.25)]);

    let ints = dir.path().join("ints.parquet");
    write_column(&ints, "Close", Arc::new(Int64Array::from(vec![5, 6, 7])));
    let series = ParquetReader::new(&ints).read_close("Close").unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.close(2), Some(dec!(7)));
}

#[test]
fn test_missing_column_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.parquet");
    write_column(&path, "Open", Arc::new(Float64Array::from(vec![1.0])));

    assert!(ParquetReader::new(&path).read_close("Close").is_err());
}

#[test]
fn test_null_close_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.parquet");
    write_column(
        &path,
        "Close",
        Arc::new(Float64Array::from(vec![Some(1.0), None])),
    );

    let err = ParquetReader::new(&path).read_close("Close").unwrap_err();
    assert!(err.to_string().contains("row 1"));
}

#[test]
fn test_unsupported_column_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.parquet");
    let schema = Arc::new(Schema::new(vec![Field::new("Close", DataType::Boolean, false)]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(arrow::array::BooleanArray::from(vec![true])) as ArrayRef],
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    assert!(ParquetReader::new(&path).read_close("Close").is_err());
}

#[test]
fn test_missing_file_is_error() {
    assert!(ParquetReader::new("/nonexistent/feed.parquet")
        .read_close("Close")
        .is_err());
}

#[test]
fn test_backtest_from_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.parquet");
    let b = dir.path().join("b.parquet");
    write_column(&a, "Close", Arc::new(Float64Array::from(vec![100.0, 101.0, 99.0])));
    write_column(&b, "Close", Arc::new(Float64Array::from(vec![50.0, 50.0, 51.0])));

    let mut sources = SourceMap::new();
    sources.insert(
        "A".to_string(),
        Box::new(ParquetReader::new(&a).read_close("Close").unwrap()),
    );
    sources.insert(
        "B".to_string(),
        Box::new(ParquetReader::new(&b).read_close("Close").unwrap()),
    );

    let strategy = HoldStrategy::new(PositionMap::new().with("A", dec!(1)));
    let mut backtest = Backtest::new(sources, Box::new(strategy), BacktestConfig::default());
    let report = backtest.run(None).unwrap();

    assert_eq!(report.metrics.total_profit, dec!(-1.04));
}
