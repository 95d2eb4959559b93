//! CLI interface for tick-backtest
//!
//! Provides subcommands for:
//! - `backtest`: Replay a strategy over Parquet close series
//! - `config`: Show the effective configuration

mod backtest;

pub use backtest::{parse_feed_arg, BacktestArgs, OutputFormat};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tick-backtest")]
#[command(about = "Tick-by-tick strategy replay with position accounting and risk metrics")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay the configured strategy over historical closes
    Backtest(BacktestArgs),
    /// Show the effective configuration
    Config,
}
