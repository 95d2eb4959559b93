//! Backtesting module
//!
//! Replays close prices tick by tick through a strategy, then prices the
//! resulting position-map history into daily profit and summary metrics

mod analytics;
mod chart;
mod feed;
mod position;
mod replay;
mod simulator;
mod types;

pub use analytics::{
    compute_daily_profit, count_trades, max_position, return_pct, sortino_ratio, total_profit,
    BacktestReport, BacktestSummary, PriceHistory,
};
pub use chart::{ChartSink, RecordingChart};
pub use feed::{Feed, FeedSet, DEFAULT_MAX_LEN};
pub use position::{Position, PositionMap};
pub use replay::{common_len, PriceSeries, PriceSource, SourceMap, TickCloses, TickStream};
pub use simulator::Backtest;
pub use types::{BacktestError, BacktestResult, Direction};

use rust_decimal::Decimal;
use serde::Deserialize;

/// Backtest configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BacktestConfig {
    /// Commission charged per unit of notional traded
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
    /// Capacity of each live feed
    #[serde(default = "default_max_feed_len")]
    pub max_feed_len: usize,
    /// Ticks to replay; all available when unset
    #[serde(default)]
    pub num_ticks: Option<usize>,
    /// Annual risk-free rate used by the Sortino ratio
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Ticks per year (one-minute bars by default)
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(4, 4) // 0.0004 = 4 bps
}
fn default_max_feed_len() -> usize {
    DEFAULT_MAX_LEN
}
fn default_risk_free_rate() -> f64 {
    0.05
}
fn default_periods_per_year() -> f64 {
    365.0 * 60.0 * 24.0
}

impl BacktestConfig {
    /// Risk-free return of a single tick
    pub fn risk_free_per_period(&self) -> f64 {
        self.risk_free_rate / self.periods_per_year
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            max_feed_len: default_max_feed_len(),
            num_ticks: None,
            risk_free_rate: default_risk_free_rate(),
            periods_per_year: default_periods_per_year(),
        }
    }
}
