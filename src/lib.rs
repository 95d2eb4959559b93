//! tick-backtest: tick-by-tick strategy replay
//!
//! This library provides the core components for:
//! - Bounded close-price feeds with half-compaction on overflow
//! - A strategy contract with offline warm-up replay and opt-in diagnostics
//! - Position-map accounting with commission on every rebalance
//! - Daily profit, trade count, return and Sortino ratio metrics
//! - Close series loading from Parquet
//! - Structured logging and run metrics

pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod strategy;
pub mod telemetry;
