//! Moving-average crossover strategy

use super::{Diagnostics, PlotLines, PlotPoint, Strategy};
use crate::backtest::{BacktestError, BacktestResult, Feed, FeedSet, PositionMap};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Per-symbol chart state
#[derive(Debug, Clone, Default)]
struct SymbolPlot {
    lines: PlotLines,
    points: Vec<PlotPoint>,
    last_target: Decimal,
}

/// Long `quantity` while the fast SMA is above the slow SMA, short (when
/// enabled) while it is below, flat otherwise
///
/// The decision for each symbol depends only on the tail of its feed.
#[derive(Debug, Clone)]
pub struct SmaCrossStrategy {
    fast: usize,
    slow: usize,
    quantity: Decimal,
    allow_short: bool,
    record_diagnostics: bool,
    tick: usize,
    plots: BTreeMap<String, SymbolPlot>,
}

impl SmaCrossStrategy {
    /// Create a crossover strategy with `fast < slow` windows
    pub fn new(fast: usize, slow: usize, quantity: Decimal) -> BacktestResult<Self> {
        if fast == 0 {
            return Err(BacktestError::InvalidParameter(
                "fast window must be at least 1".to_string(),
            ));
        }
        if slow <= fast {
            return Err(BacktestError::InvalidParameter(format!(
                "slow window ({slow}) must be longer than fast window ({fast})"
            )));
        }
        if quantity <= Decimal::ZERO {
            return Err(BacktestError::InvalidParameter(format!(
                "quantity must be positive, got {quantity}"
            )));
        }

        Ok(Self {
            fast,
            slow,
            quantity,
            allow_short: false,
            record_diagnostics: false,
            tick: 0,
            plots: BTreeMap::new(),
        })
    }

    /// Go short when the fast SMA is below the slow SMA
    pub fn with_short(mut self, allow_short: bool) -> Self {
        self.allow_short = allow_short;
        self
    }

    /// Record close/SMA lines and position-change markers per symbol
    pub fn with_diagnostics(mut self, record: bool) -> Self {
        self.record_diagnostics = record;
        self
    }

    /// Drop recorded diagnostics and restart tick numbering
    pub fn clear_diagnostics(&mut self) {
        self.plots.clear();
        self.tick = 0;
    }

    fn target(&self, fast: Option<Decimal>, slow: Option<Decimal>) -> Decimal {
        match (fast, slow) {
            (Some(f), Some(s)) if f > s => self.quantity,
            (Some(f), Some(s)) if f < s && self.allow_short => -self.quantity,
            _ => Decimal::ZERO,
        }
    }

    fn record(
        &mut self,
        symbol: &str,
        close: Option<Decimal>,
        fast: Option<Decimal>,
        slow: Option<Decimal>,
        target: Decimal,
    ) {
        let fast_label = format!("sma {}", self.fast);
        let slow_label = format!("sma {}", self.slow);
        let tick = self.tick;

        let plot = self.plots.entry(symbol.to_string()).or_default();
        for (label, value) in [
            (format!("{symbol} close"), close),
            (fast_label, fast),
            (slow_label, slow),
        ] {
            let line = plot.lines.entry(label).or_default();
            // Symbols first seen mid-replay are padded so lines stay tick-aligned
            line.resize(tick, None);
            line.push(value);
        }

        if target != plot.last_target {
            let name = if target > Decimal::ZERO {
                "long"
            } else if target < Decimal::ZERO {
                "short"
            } else {
                "flat"
            };
            if let Some(close) = close {
                plot.points.push(PlotPoint::new(tick, close, name));
            }
            plot.last_target = target;
        }
    }
}

/// Mean of the last `window` closes, if the feed holds that many
fn sma(feed: &Feed, window: usize) -> BacktestResult<Option<Decimal>> {
    if feed.len() < window {
        return Ok(None);
    }
    let sum = feed
        .tail(window)
        .iter()
        .try_fold(Decimal::ZERO, |sum, close| sum.checked_add(*close))
        .ok_or_else(|| BacktestError::overflow(format!("sma {window}")))?;
    Ok(Some(sum / Decimal::from(window)))
}

impl Strategy for SmaCrossStrategy {
    fn make_decision(&mut self, feeds: &FeedSet) -> BacktestResult<PositionMap> {
        let mut decision = PositionMap::new();

        for (symbol, feed) in feeds {
            let fast = sma(feed, self.fast)?;
            let slow = sma(feed, self.slow)?;
            let target = self.target(fast, slow);
            decision.set(symbol.as_str(), target);

            if self.record_diagnostics {
                self.record(symbol, feed.latest(), fast, slow, target);
            }
        }

        self.tick += 1;
        Ok(decision)
    }

    fn begin_run(&mut self) {
        self.clear_diagnostics();
    }

    fn name(&self) -> &str {
        "SMA Crossover"
    }

    fn diagnostics(&self) -> Option<&dyn Diagnostics> {
        if self.record_diagnostics {
            Some(self)
        } else {
            None
        }
    }
}

impl Diagnostics for SmaCrossStrategy {
    fn plot_lines(&self) -> Vec<PlotLines> {
        self.plots.values().map(|plot| plot.lines.clone()).collect()
    }

    fn plot_points(&self) -> Vec<Vec<PlotPoint>> {
        self.plots.values().map(|plot| plot.points.clone()).collect()
    }
}
