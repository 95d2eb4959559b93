//! Backtest command implementation

use crate::backtest::{Backtest, BacktestReport, PriceSource, RecordingChart, SourceMap};
use crate::config::Config;
use crate::data::{ParquetReader, DEFAULT_CLOSE_COLUMN};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::PathBuf;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Instrument feed as SYMBOL=PATH to a Parquet file (repeatable)
    #[arg(long = "feed", value_parser = parse_feed_arg, required = true)]
    pub feeds: Vec<(String, PathBuf)>,

    /// Name of the close price column
    #[arg(long, default_value = DEFAULT_CLOSE_COLUMN)]
    pub column: String,

    /// Number of ticks to replay (defaults to the full series)
    #[arg(long)]
    pub num_ticks: Option<usize>,

    /// Commission rate override
    #[arg(long)]
    pub commission: Option<Decimal>,

    /// Warm the strategy up on the full history before replaying
    #[arg(long)]
    pub prepare: bool,

    /// Include the profit curve and strategy diagnostics in the output
    #[arg(long)]
    pub plot: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Parse a `SYMBOL=PATH` feed argument
pub fn parse_feed_arg(arg: &str) -> Result<(String, PathBuf), String> {
    let (symbol, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PATH, got {arg:?}"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() || path.is_empty() {
        return Err(format!("expected SYMBOL=PATH, got {arg:?}"));
    }
    Ok((symbol.to_string(), PathBuf::from(path)))
}

impl BacktestArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut backtest_config = config.backtest.clone();
        if let Some(rate) = self.commission {
            backtest_config.commission_rate = rate;
        }
        let num_ticks = self.num_ticks.or(backtest_config.num_ticks);

        let mut sources = SourceMap::new();
        for (symbol, path) in &self.feeds {
            let series = ParquetReader::new(path).read_close(&self.column)?;
            tracing::info!(symbol = %symbol, path = ?path, rows = series.len(), "Loaded feed");
            sources.insert(symbol.clone(), Box::new(series));
        }

        for symbol in config.strategy.symbols() {
            if !sources.contains_key(symbol) {
                anyhow::bail!("Strategy holds {} but no feed was given for it", symbol);
            }
        }

        let strategy = config.strategy.build(self.plot)?;
        let mut backtest = Backtest::new(sources, strategy, backtest_config);

        if self.prepare {
            tracing::info!("Preparing strategy on full history");
            backtest.prepare_strategy()?;
        }

        let mut chart = RecordingChart::default();
        let report = if self.plot {
            backtest.run_with_chart(num_ticks, &mut chart)?
        } else {
            backtest.run(num_ticks)?
        };

        match self.format {
            OutputFormat::Table => {
                println!("{}", report.metrics.format_table());
                if self.plot {
                    println!("{}", serde_json::to_string_pretty(&chart)?);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&self.json_output(&report, &chart))?);
            }
        }

        Ok(())
    }

    fn json_output(&self, report: &BacktestReport, chart: &RecordingChart) -> serde_json::Value {
        let mut output = json!({
            "metrics": report.metrics,
            "positions": report.positions,
        });
        if self.plot {
            output["chart"] = json!(chart);
        }
        output
    }
}
