//! Integration tests

mod backtest_test;
mod e2e_test;
mod parquet_test;
