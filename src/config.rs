//! Configuration types for tick-backtest

use crate::backtest::{BacktestConfig, PositionMap};
use crate::strategy::{HoldStrategy, SmaCrossStrategy, Strategy};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backtest: BacktestConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Strategy selection and parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Hold a fixed position map
    Hold {
        #[serde(default)]
        positions: BTreeMap<String, Decimal>,
    },
    /// Fast/slow simple moving average crossover
    SmaCross {
        fast: usize,
        slow: usize,
        quantity: Decimal,
        #[serde(default)]
        allow_short: bool,
    },
}

impl StrategyConfig {
    /// Build the configured strategy
    pub fn build(&self, record_diagnostics: bool) -> anyhow::Result<Box<dyn Strategy>> {
        let strategy: Box<dyn Strategy> = match self {
            StrategyConfig::Hold { positions } => {
                let target: PositionMap = positions
                    .iter()
                    .map(|(symbol, quantity)| (symbol.as_str(), *quantity))
                    .collect();
                Box::new(HoldStrategy::new(target))
            }
            StrategyConfig::SmaCross {
                fast,
                slow,
                quantity,
                allow_short,
            } => Box::new(
                SmaCrossStrategy::new(*fast, *slow, *quantity)?
                    .with_short(*allow_short)
                    .with_diagnostics(record_diagnostics),
            ),
        };
        Ok(strategy)
    }

    /// Instruments a hold strategy references
    pub fn symbols(&self) -> Vec<&str> {
        match self {
            StrategyConfig::Hold { positions } => positions.keys().map(String::as_str).collect(),
            StrategyConfig::SmaCross { .. } => Vec::new(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration bundled with the crate
    pub fn example() -> anyhow::Result<Self> {
        let config: Config = toml::from_str(include_str!("../config.toml.example"))?;
        Ok(config)
    }
}
