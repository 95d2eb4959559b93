//! Hand-off point to chart renderers
//!
//! The engine never draws anything itself. When asked to, it passes the
//! cumulative profit curve and the strategy's panels to a [`ChartSink`].

use crate::strategy::PlotPanel;
use rust_decimal::Decimal;
use serde::Serialize;

/// Receiver for the series a chart renderer needs
pub trait ChartSink {
    /// Running profit, starting at zero before the first tick
    fn profit_curve(&mut self, cumulative: &[Decimal]);

    /// Diagnostic panels of the named strategy
    fn strategy_panels(&mut self, strategy: &str, panels: &[PlotPanel]);
}

/// Sink that keeps everything it is given
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingChart {
    pub profit: Vec<Decimal>,
    pub strategy: Option<String>,
    pub panels: Vec<PlotPanel>,
}

impl ChartSink for RecordingChart {
    fn profit_curve(&mut self, cumulative: &[Decimal]) {
        self.profit = cumulative.to_vec();
    }

    fn strategy_panels(&mut self, strategy: &str, panels: &[PlotPanel]) {
        self.strategy = Some(strategy.to_string());
        self.panels = panels.to_vec();
    }
}
