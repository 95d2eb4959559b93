//! Run metrics
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks replayed across all runs
    TicksReplayed,
    /// Position-map changes across all runs
    Trades,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Total profit of the last run
    TotalProfit,
    /// Return percentage of the last run
    ReturnPct,
    /// Sortino ratio of the last run
    SortinoRatio,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::TicksReplayed => "tick_backtest_ticks_replayed_total",
            CounterMetric::Trades => "tick_backtest_trades_total",
        }
    }
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::TotalProfit => "tick_backtest_total_profit",
            GaugeMetric::ReturnPct => "tick_backtest_return_pct",
            GaugeMetric::SortinoRatio => "tick_backtest_sortino_ratio",
        }
    }
}

/// Add `value` to a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    let metric_name = metric.name();
    ::metrics::counter!(metric_name).increment(value);
    tracing::debug!(metric = metric_name, value, "Incrementing counter");
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = metric.name();
    ::metrics::gauge!(metric_name).set(value);
    tracing::debug!(metric = metric_name, value = value, "Setting gauge");
}
