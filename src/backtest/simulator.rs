//! Backtest simulator engine

use super::analytics::{compute_daily_profit, BacktestReport, BacktestSummary, PriceHistory};
use super::chart::ChartSink;
use super::feed::{Feed, FeedSet};
use super::replay::{common_len, PriceSource, SourceMap, TickStream};
use super::types::{BacktestError, BacktestResult};
use super::BacktestConfig;
use crate::strategy::Strategy;
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use rust_decimal::prelude::ToPrimitive;
use std::time::Instant;

/// Replays a strategy over per-instrument price sources
pub struct Backtest {
    sources: SourceMap,
    strategy: Box<dyn Strategy>,
    config: BacktestConfig,
}

impl Backtest {
    /// Create a backtest over `sources`, keyed by symbol
    pub fn new(sources: SourceMap, strategy: Box<dyn Strategy>, config: BacktestConfig) -> Self {
        Self {
            sources,
            strategy,
            config,
        }
    }

    /// Add or replace the source for a symbol
    pub fn with_source(mut self, symbol: impl Into<String>, source: impl PriceSource + 'static) -> Self {
        self.sources.insert(symbol.into(), Box::new(source));
        self
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Warm up the strategy on the full history of every source
    pub fn prepare_strategy(&mut self) -> BacktestResult<()> {
        let num_ticks = common_len(&self.sources)?;
        let mut history = FeedSet::new();
        for (symbol, source) in &self.sources {
            // Sized to hold the whole series without compaction
            let mut feed = Feed::with_max_len(num_ticks.max(2))?;
            for row in 0..num_ticks {
                let close = source.close(row).ok_or_else(|| BacktestError::MissingPrice {
                    symbol: symbol.clone(),
                    row,
                })?;
                feed.append_item(close);
            }
            history.insert(symbol.as_str(), feed);
        }
        self.strategy.prepare(&history)
    }

    /// Run the replay over `num_ticks` ticks, or all of them
    pub fn run(&mut self, num_ticks: Option<usize>) -> BacktestResult<BacktestReport> {
        let available = common_len(&self.sources)?;
        let num_ticks = match num_ticks {
            None => available,
            Some(requested) if requested > available => {
                return Err(BacktestError::InsufficientHistory {
                    requested,
                    available,
                })
            }
            Some(requested) => requested,
        };

        tracing::info!(
            strategy = self.strategy.name(),
            instruments = self.sources.len(),
            num_ticks,
            "Starting replay"
        );
        let started = Instant::now();

        let mut feeds = FeedSet::with_symbols(self.sources.keys().cloned(), self.config.max_feed_len)?;
        let mut prices = PriceHistory::new();
        let mut positions = Vec::with_capacity(num_ticks);

        self.strategy.begin_run();
        for item in TickStream::new(&self.sources, num_ticks) {
            let (tick, closes) = item?;
            feeds.append_tick(&closes);
            for (symbol, close) in &closes {
                prices.push(symbol, *close);
            }

            let decision = self.strategy.make_decision(&feeds)?;
            if let Some(symbol) = decision.symbols().find(|s| !feeds.contains(s)) {
                return Err(BacktestError::UnknownSymbol {
                    tick,
                    symbol: symbol.to_string(),
                });
            }
            positions.push(decision);
        }

        let daily_profit = compute_daily_profit(&positions, &prices, self.config.commission_rate)?;
        let metrics = BacktestSummary::compute(
            &daily_profit,
            &positions,
            &prices,
            self.config.risk_free_per_period(),
        )?;

        increment_counter(CounterMetric::TicksReplayed, num_ticks as u64);
        increment_counter(CounterMetric::Trades, metrics.num_trades as u64);
        set_gauge(
            GaugeMetric::TotalProfit,
            metrics.total_profit.to_f64().unwrap_or_default(),
        );
        set_gauge(
            GaugeMetric::ReturnPct,
            metrics.return_pct.to_f64().unwrap_or_default(),
        );
        if let Some(ratio) = metrics.sortino_ratio {
            set_gauge(GaugeMetric::SortinoRatio, ratio);
        }

        tracing::info!(
            total_profit = %metrics.total_profit,
            num_trades = metrics.num_trades,
            return_pct = %metrics.return_pct,
            sortino_ratio = ?metrics.sortino_ratio,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Replay finished"
        );

        Ok(BacktestReport {
            metrics,
            positions,
            daily_profit,
        })
    }

    /// Run the replay and hand the profit curve and strategy diagnostics to `chart`
    pub fn run_with_chart(
        &mut self,
        num_ticks: Option<usize>,
        chart: &mut dyn ChartSink,
    ) -> BacktestResult<BacktestReport> {
        let report = self.run(num_ticks)?;

        chart.profit_curve(&report.cumulative_profit());
        let panels = self
            .strategy
            .diagnostics()
            .map(|diagnostics| diagnostics.panels())
            .unwrap_or_default();
        chart.strategy_panels(self.strategy.name(), &panels);

        Ok(report)
    }
}
