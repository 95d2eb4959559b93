//! Backtest types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Backtest errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BacktestError {
    /// Direction string was neither "long" nor "short"
    #[error("Invalid direction: {0:?} (expected \"long\" or \"short\")")]
    InvalidDirection(String),
    /// Position snapshot built with a negative amount
    #[error("Negative position amount {amount} for {symbol}")]
    NegativeAmount { symbol: String, amount: Decimal },
    /// Feeds handed to a replay do not share a common length
    #[error("Feed {symbol} has {actual} rows, expected {expected}")]
    MismatchedFeedLength {
        symbol: String,
        expected: usize,
        actual: usize,
    },
    /// Replay started without any instrument
    #[error("No feeds to replay")]
    NoFeeds,
    /// More ticks requested than the sources hold
    #[error("Requested {requested} ticks but only {available} are available")]
    InsufficientHistory { requested: usize, available: usize },
    /// Strategy referenced an instrument the backtest does not know
    #[error("Unknown symbol {symbol} in position map at tick {tick}")]
    UnknownSymbol { tick: usize, symbol: String },
    /// Feed capacity too small to compact
    #[error("Invalid feed capacity: {0} (must be at least 2)")]
    InvalidCapacity(usize),
    /// Source has no close price at a row it claims to hold
    #[error("Missing close price for {symbol} at row {row}")]
    MissingPrice { symbol: String, row: usize },
    /// Strategy constructed with unusable parameters
    #[error("Invalid strategy parameter: {0}")]
    InvalidParameter(String),
    /// Strategy failed to produce a decision
    #[error("Strategy error: {0}")]
    Strategy(String),
    /// Decimal arithmetic left the representable range
    #[error("Arithmetic overflow computing {0}")]
    Overflow(String),
}

impl BacktestError {
    pub(crate) fn overflow(what: impl Into<String>) -> Self {
        BacktestError::Overflow(what.into())
    }
}

/// Shared length of a set of named series
///
/// Fails with [`BacktestError::NoFeeds`] when there are none and with
/// [`BacktestError::MismatchedFeedLength`] naming the first series whose
/// length differs from the first one's.
pub(crate) fn shared_len<'a, I>(lengths: I) -> BacktestResult<usize>
where
    I: IntoIterator<Item = (&'a String, usize)>,
{
    let mut iter = lengths.into_iter();
    let Some((_, expected)) = iter.next() else {
        return Err(BacktestError::NoFeeds);
    };
    for (symbol, actual) in iter {
        if actual != expected {
            return Err(BacktestError::MismatchedFeedLength {
                symbol: symbol.clone(),
                expected,
                actual,
            });
        }
    }
    Ok(expected)
}

/// Result alias for backtest operations
pub type BacktestResult<T> = std::result::Result<T, BacktestError>;

/// Direction of an open exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profits when price rises
    Long,
    /// Profits when price falls
    Short,
}

impl Direction {
    /// Direction implied by a signed quantity. Zero maps to short.
    pub fn from_quantity(quantity: Decimal) -> Self {
        if quantity > Decimal::ZERO {
            Direction::Long
        } else {
            Direction::Short
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl FromStr for Direction {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(BacktestError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
