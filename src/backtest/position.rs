//! Position maps and snapshots

use super::types::{BacktestError, BacktestResult, Direction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Desired exposure for one tick: symbol to signed quantity
///
/// Zero quantities are never stored, so a missing symbol and an explicit zero
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Decimal>", into = "BTreeMap<String, Decimal>")]
pub struct PositionMap {
    quantities: BTreeMap<String, Decimal>,
}

impl PositionMap {
    /// Create a flat (empty) position map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantity for a symbol. Zero removes the entry.
    pub fn set(&mut self, symbol: impl Into<String>, quantity: Decimal) {
        let symbol = symbol.into();
        if quantity.is_zero() {
            self.quantities.remove(&symbol);
        } else {
            self.quantities.insert(symbol, quantity.normalize());
        }
    }

    /// Builder form of [`PositionMap::set`]
    pub fn with(mut self, symbol: impl Into<String>, quantity: Decimal) -> Self {
        self.set(symbol, quantity);
        self
    }

    /// Signed quantity for a symbol, zero if absent
    pub fn quantity(&self, symbol: &str) -> Decimal {
        self.quantities.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Decimal> {
        self.quantities.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.quantities.keys().map(String::as_str)
    }

    /// Number of non-zero entries
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// True when the map holds no exposure
    pub fn is_flat(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Sum of `|quantity| * price` using `price_of` to resolve each symbol
    pub fn notional<F>(&self, mut price_of: F) -> BacktestResult<Decimal>
    where
        F: FnMut(&str) -> BacktestResult<Decimal>,
    {
        let mut total = Decimal::ZERO;
        for (symbol, quantity) in &self.quantities {
            total = quantity
                .abs()
                .checked_mul(price_of(symbol)?)
                .and_then(|value| total.checked_add(value))
                .ok_or_else(|| BacktestError::overflow(format!("notional of {symbol}")))?;
        }
        Ok(total)
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for PositionMap {
    fn from_iter<T: IntoIterator<Item = (S, Decimal)>>(iter: T) -> Self {
        let mut map = PositionMap::new();
        for (symbol, quantity) in iter {
            map.set(symbol, quantity);
        }
        map
    }
}

impl From<BTreeMap<String, Decimal>> for PositionMap {
    fn from(raw: BTreeMap<String, Decimal>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<PositionMap> for BTreeMap<String, Decimal> {
    fn from(map: PositionMap) -> Self {
        map.quantities
    }
}

impl<'a> IntoIterator for &'a PositionMap {
    type Item = (&'a String, &'a Decimal);
    type IntoIter = btree_map::Iter<'a, String, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.quantities.iter()
    }
}

/// One open exposure, fixed at the tick it was established
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Instrument symbol
    pub symbol: String,
    /// Entry price (close at the establishing tick)
    pub price: Decimal,
    /// Absolute size
    pub amount: Decimal,
    /// Long or short
    pub direction: Direction,
}

impl Position {
    /// Create a snapshot, rejecting negative amounts
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        amount: Decimal,
        direction: Direction,
    ) -> BacktestResult<Self> {
        let symbol = symbol.into();
        if amount < Decimal::ZERO {
            return Err(BacktestError::NegativeAmount { symbol, amount });
        }
        Ok(Self {
            symbol,
            price,
            amount,
            direction,
        })
    }

    /// Create a snapshot from a direction label ("long" / "short")
    pub fn from_parts(
        symbol: impl Into<String>,
        price: Decimal,
        amount: Decimal,
        direction: &str,
    ) -> BacktestResult<Self> {
        Self::new(symbol, price, amount, direction.parse()?)
    }

    /// Snapshot for a signed position-map quantity
    pub fn from_quantity(symbol: impl Into<String>, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            amount: quantity.abs(),
            direction: Direction::from_quantity(quantity),
        }
    }

    /// Mark-to-market P&L against a later price
    pub fn pnl_at(&self, current_price: Decimal) -> BacktestResult<Decimal> {
        let change = match self.direction {
            Direction::Long => current_price.checked_sub(self.price),
            Direction::Short => self.price.checked_sub(current_price),
        };
        change
            .and_then(|delta| self.amount.checked_mul(delta))
            .ok_or_else(|| BacktestError::overflow(format!("P&L of {}", self.symbol)))
    }
}
