//! Strategy contract
//!
//! A strategy sees every instrument's feed after each tick's close has been
//! appended and answers with the position map it wants to hold for that tick.

mod diagnostics;
mod hold;
mod sma_cross;

pub use diagnostics::{Diagnostics, PlotLines, PlotPanel, PlotPoint};
pub use hold::HoldStrategy;
pub use sma_cross::SmaCrossStrategy;

use crate::backtest::{BacktestError, BacktestResult, FeedSet, PositionMap, DEFAULT_MAX_LEN};

/// Decision policy driven by the backtest engine
pub trait Strategy {
    /// Position map to hold after this tick, given feeds current through it
    fn make_decision(&mut self, feeds: &FeedSet) -> BacktestResult<PositionMap>;

    /// Replay full history through `make_decision`, discarding the decisions
    ///
    /// Used to warm up internal state before a live replay. All feeds must
    /// have the same length.
    fn prepare(&mut self, feeds: &FeedSet) -> BacktestResult<()> {
        let num_ticks = feeds.common_len()?;
        let mut replay = FeedSet::with_symbols(feeds.symbols(), DEFAULT_MAX_LEN)?;

        for tick in 0..num_ticks {
            for (symbol, feed) in feeds {
                let close = feed.get(tick).ok_or_else(|| BacktestError::MissingPrice {
                    symbol: symbol.clone(),
                    row: tick,
                })?;
                if let Some(target) = replay.get_mut(symbol) {
                    target.append_item(close);
                }
            }
            self.make_decision(&replay)?;
        }

        tracing::debug!(strategy = self.name(), num_ticks, "Strategy prepared");
        Ok(())
    }

    /// Called by the engine before the first tick of every replay
    ///
    /// Strategies that accumulate per-replay state (such as diagnostics)
    /// reset it here so it lines up with the replay that follows.
    fn begin_run(&mut self) {}

    /// Display label
    fn name(&self) -> &str {
        "Strategy"
    }

    /// Diagnostic series, for strategies that record them
    fn diagnostics(&self) -> Option<&dyn Diagnostics> {
        None
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn make_decision(&mut self, feeds: &FeedSet) -> BacktestResult<PositionMap> {
        (**self).make_decision(feeds)
    }

    fn prepare(&mut self, feeds: &FeedSet) -> BacktestResult<()> {
        (**self).prepare(feeds)
    }

    fn begin_run(&mut self) {
        (**self).begin_run()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn diagnostics(&self) -> Option<&dyn Diagnostics> {
        (**self).diagnostics()
    }
}
