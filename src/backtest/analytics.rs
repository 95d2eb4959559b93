//! Backtest analytics and reporting
//!
//! Turns the per-tick position-map history into daily profit and the summary
//! metrics. Money stays in `Decimal`; the Sortino ratio is a statistic and is
//! computed in `f64`.

use super::position::{Position, PositionMap};
use super::types::{BacktestError, BacktestResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Close prices observed during a replay, one column per symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    columns: BTreeMap<String, Vec<Decimal>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the close of `symbol` for the next tick
    pub fn push(&mut self, symbol: &str, close: Decimal) {
        match self.columns.get_mut(symbol) {
            Some(column) => column.push(close),
            None => {
                self.columns.insert(symbol.to_string(), vec![close]);
            }
        }
    }

    /// Close of `symbol` at `tick`
    pub fn price(&self, symbol: &str, tick: usize) -> BacktestResult<Decimal> {
        self.columns
            .get(symbol)
            .and_then(|column| column.get(tick))
            .copied()
            .ok_or_else(|| BacktestError::MissingPrice {
                symbol: symbol.to_string(),
                row: tick,
            })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Decimal>)> for PriceHistory {
    fn from_iter<T: IntoIterator<Item = (S, Vec<Decimal>)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().map(|(s, c)| (s.into(), c)).collect(),
        }
    }
}

/// Commission on the notional of `positions` at the closes of `tick`
fn commission(
    positions: &PositionMap,
    prices: &PriceHistory,
    tick: usize,
    commission_rate: Decimal,
) -> BacktestResult<Decimal> {
    let notional = positions.notional(|symbol| prices.price(symbol, tick))?;
    commission_rate
        .checked_mul(notional)
        .ok_or_else(|| BacktestError::overflow(format!("commission at tick {tick}")))
}

/// Profit of every tick of a replay
///
/// Each tick marks the snapshots taken at the previous tick to the current
/// close. Commission is charged on the opening notional at tick 0, and on any
/// later tick whose map differs from the previous one it is charged on both
/// the outgoing and the incoming notional.
pub fn compute_daily_profit(
    positions: &[PositionMap],
    prices: &PriceHistory,
    commission_rate: Decimal,
) -> BacktestResult<Vec<Decimal>> {
    let mut daily_profit = Vec::with_capacity(positions.len());
    let mut open: Vec<Position> = Vec::new();

    for (tick, current) in positions.iter().enumerate() {
        let overflow = || BacktestError::overflow(format!("profit at tick {tick}"));
        let mut profit = Decimal::ZERO;

        for position in &open {
            let pnl = position.pnl_at(prices.price(&position.symbol, tick)?)?;
            profit = profit.checked_add(pnl).ok_or_else(overflow)?;
        }

        let fees = if tick == 0 {
            commission(current, prices, tick, commission_rate)?
        } else if *current != positions[tick - 1] {
            let fees = commission(current, prices, tick, commission_rate)?
                .checked_add(commission(&positions[tick - 1], prices, tick, commission_rate)?)
                .ok_or_else(overflow)?;
            tracing::debug!(tick, fees = %fees, "Rebalance");
            fees
        } else {
            Decimal::ZERO
        };
        profit = profit.checked_sub(fees).ok_or_else(overflow)?;

        open.clear();
        for (symbol, quantity) in current {
            open.push(Position::from_quantity(
                symbol.as_str(),
                prices.price(symbol, tick)?,
                *quantity,
            ));
        }

        daily_profit.push(profit);
    }

    Ok(daily_profit)
}

/// Number of ticks whose position map differs from the next one
pub fn count_trades(positions: &[PositionMap]) -> usize {
    positions.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Largest gross notional held at any tick
pub fn max_position(positions: &[PositionMap], prices: &PriceHistory) -> BacktestResult<Decimal> {
    let mut max = Decimal::ZERO;
    for (tick, map) in positions.iter().enumerate() {
        let notional = map.notional(|symbol| prices.price(symbol, tick))?;
        max = max.max(notional);
    }
    Ok(max)
}

/// Total profit as a percentage of the largest notional held. Zero when
/// nothing was ever held.
pub fn return_pct(total_profit: Decimal, max_position: Decimal) -> BacktestResult<Decimal> {
    if max_position.is_zero() {
        return Ok(Decimal::ZERO);
    }
    total_profit
        .checked_div(max_position)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or_else(|| BacktestError::overflow("return percentage"))
}

/// Sum of per-tick profit
pub fn total_profit(daily_profit: &[Decimal]) -> BacktestResult<Decimal> {
    daily_profit
        .iter()
        .try_fold(Decimal::ZERO, |total, profit| total.checked_add(*profit))
        .ok_or_else(|| BacktestError::overflow("total profit"))
}

/// Sortino ratio of the per-tick profits normalized by `max_position`
///
/// Returns `None` when the ratio is undefined: nothing was ever held, no tick
/// lost money, or the losing ticks have zero spread.
pub fn sortino_ratio(
    daily_profit: &[Decimal],
    max_position: Decimal,
    risk_free_per_period: f64,
) -> Option<f64> {
    if daily_profit.is_empty() || max_position.is_zero() {
        return None;
    }

    let max_position = max_position.to_f64()?;
    let normalized: Vec<f64> = daily_profit
        .iter()
        .map(|p| p.to_f64().map(|p| p / max_position))
        .collect::<Option<_>>()?;

    let n = normalized.len() as f64;
    let mean = normalized.iter().sum::<f64>() / n;

    let downside: Vec<f64> = normalized.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return None;
    }

    // Population standard deviation of the losing ticks only
    let m = downside.len() as f64;
    let downside_mean = downside.iter().sum::<f64>() / m;
    let variance = downside
        .iter()
        .map(|r| (r - downside_mean).powi(2))
        .sum::<f64>()
        / m;
    let downside_std = variance.sqrt();

    if downside_std == 0.0 || !downside_std.is_finite() {
        return None;
    }

    Some((mean - risk_free_per_period) / downside_std)
}

/// Summary statistics from backtest
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestSummary {
    /// Sum of daily profit
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit: Decimal,
    /// Number of position-map changes
    pub num_trades: usize,
    /// Downside-risk adjusted return, `None` when undefined
    pub sortino_ratio: Option<f64>,
    /// Total profit relative to the largest notional held
    #[serde(rename = "return, %", with = "rust_decimal::serde::float")]
    pub return_pct: Decimal,
    /// Largest gross notional held at any tick
    #[serde(skip)]
    pub max_position: Decimal,
}

impl BacktestSummary {
    /// Aggregate metrics from a replay's daily profit and position history
    pub fn compute(
        daily_profit: &[Decimal],
        positions: &[PositionMap],
        prices: &PriceHistory,
        risk_free_per_period: f64,
    ) -> BacktestResult<Self> {
        let total_profit = total_profit(daily_profit)?;
        let max_position = max_position(positions, prices)?;

        Ok(Self {
            total_profit,
            num_trades: count_trades(positions),
            sortino_ratio: sortino_ratio(daily_profit, max_position, risk_free_per_period),
            return_pct: return_pct(total_profit, max_position)?,
            max_position,
        })
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let sortino = match self.sortino_ratio {
            Some(ratio) => format!("{:.4}", ratio),
            None => "undefined".to_string(),
        };

        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Total Profit:     {:+.4}
Return:           {:+.4}%
Sortino Ratio:    {}
Max Position:     {:.2}

ACTIVITY
───────────────────────────────────────────────────────
Total Trades:     {}
══════════════════════════════════════════════════════
"#,
            self.total_profit, self.return_pct, sortino, self.max_position, self.num_trades,
        )
    }
}

/// Complete backtest results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestReport {
    /// Summary statistics
    pub metrics: BacktestSummary,
    /// Position map produced at every tick
    pub positions: Vec<PositionMap>,
    /// Profit of every tick
    pub daily_profit: Vec<Decimal>,
}

impl BacktestReport {
    /// Running profit, starting at zero before the first tick
    pub fn cumulative_profit(&self) -> Vec<Decimal> {
        let mut curve = Vec::with_capacity(self.daily_profit.len() + 1);
        let mut total = Decimal::ZERO;
        curve.push(total);
        for profit in &self.daily_profit {
            total = total.saturating_add(*profit);
            curve.push(total);
        }
        curve
    }
}
