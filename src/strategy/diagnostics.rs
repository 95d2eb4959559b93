//! Optional diagnostic series exposed by strategies

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Named line series of one panel. `None` marks ticks without a value.
pub type PlotLines = BTreeMap<String, Vec<Option<Decimal>>>;

/// A labeled marker at a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub tick: usize,
    pub value: Decimal,
    pub name: String,
}

impl PlotPoint {
    pub fn new(tick: usize, value: Decimal, name: impl Into<String>) -> Self {
        Self {
            tick,
            value,
            name: name.into(),
        }
    }
}

/// One chart panel: line series plus scatter markers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotPanel {
    pub lines: PlotLines,
    pub points: Vec<PlotPoint>,
}

impl PlotPanel {
    /// Markers grouped by name, in name order
    pub fn points_by_name(&self) -> BTreeMap<&str, Vec<&PlotPoint>> {
        let mut groups: BTreeMap<&str, Vec<&PlotPoint>> = BTreeMap::new();
        for point in &self.points {
            groups.entry(point.name.as_str()).or_default().push(point);
        }
        groups
    }
}

/// Diagnostic capability a strategy may opt into
pub trait Diagnostics {
    /// Line series, one map per panel
    fn plot_lines(&self) -> Vec<PlotLines>;

    /// Scatter markers, one list per panel
    fn plot_points(&self) -> Vec<Vec<PlotPoint>>;

    /// Lines and markers paired by panel. Unpaired trailing panels are dropped.
    fn panels(&self) -> Vec<PlotPanel> {
        self.plot_lines()
            .into_iter()
            .zip(self.plot_points())
            .map(|(lines, points)| PlotPanel { lines, points })
            .collect()
    }
}
