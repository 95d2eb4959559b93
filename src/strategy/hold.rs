//! Constant-exposure strategy

use super::Strategy;
use crate::backtest::{BacktestResult, FeedSet, PositionMap};

/// Holds the same position map on every tick
#[derive(Debug, Clone, Default)]
pub struct HoldStrategy {
    target: PositionMap,
}

impl HoldStrategy {
    pub fn new(target: PositionMap) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &PositionMap {
        &self.target
    }
}

impl Strategy for HoldStrategy {
    fn make_decision(&mut self, _feeds: &FeedSet) -> BacktestResult<PositionMap> {
        Ok(self.target.clone())
    }

    fn name(&self) -> &str {
        "Hold"
    }
}
