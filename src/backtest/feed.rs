//! Bounded close-price buffers
//!
//! A [`Feed`] holds the closing prices of one instrument. When an append pushes
//! it past `max_len`, the buffer is compacted down to its newest half (rounded
//! up for odd capacities) in one step, the new price included, so older history
//! is dropped in bulk rather than one element per append.

use super::types::{shared_len, BacktestError, BacktestResult};
use rust_decimal::Decimal;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Default capacity of a feed
pub const DEFAULT_MAX_LEN: usize = 1_000_000;

/// Append-only close-price buffer with half-compaction on overflow
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    close: Vec<Decimal>,
    max_len: usize,
}

impl Feed {
    /// Create an empty feed with the default capacity
    pub fn new() -> Self {
        Self {
            close: Vec::new(),
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Create an empty feed holding at most `max_len` prices
    pub fn with_max_len(max_len: usize) -> BacktestResult<Self> {
        if max_len < 2 {
            return Err(BacktestError::InvalidCapacity(max_len));
        }
        Ok(Self {
            close: Vec::new(),
            max_len,
        })
    }

    /// Append a close price, compacting if the capacity is exceeded
    pub fn append_item(&mut self, close: Decimal) {
        self.close.push(close);

        if self.close.len() > self.max_len {
            let keep = self.max_len - self.max_len / 2;
            let drop = self.close.len() - keep;
            self.close.drain(..drop);
        }
    }

    /// Number of stored prices
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Price at a buffer position (0 = oldest retained)
    pub fn get(&self, index: usize) -> Option<Decimal> {
        self.close.get(index).copied()
    }

    /// Most recent close
    pub fn latest(&self) -> Option<Decimal> {
        self.close.last().copied()
    }

    /// Up to `n` most recent prices, oldest first
    pub fn tail(&self, n: usize) -> &[Decimal] {
        let start = self.close.len().saturating_sub(n);
        &self.close[start..]
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.close
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

/// One feed per instrument, ordered by symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSet {
    feeds: BTreeMap<String, Feed>,
}

impl FeedSet {
    /// Create an empty feed set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty feeds for the given symbols
    pub fn with_symbols<I, S>(symbols: I, max_len: usize) -> BacktestResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut feeds = BTreeMap::new();
        for symbol in symbols {
            feeds.insert(symbol.into(), Feed::with_max_len(max_len)?);
        }
        Ok(Self { feeds })
    }

    /// Insert or replace the feed for a symbol
    pub fn insert(&mut self, symbol: impl Into<String>, feed: Feed) {
        self.feeds.insert(symbol.into(), feed);
    }

    pub fn get(&self, symbol: &str) -> Option<&Feed> {
        self.feeds.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut Feed> {
        self.feeds.get_mut(symbol)
    }

    /// Append one tick's closes, one per symbol
    ///
    /// Closes for symbols without a feed are ignored.
    pub fn append_tick<'a, I>(&mut self, closes: I)
    where
        I: IntoIterator<Item = &'a (String, Decimal)>,
    {
        for (symbol, close) in closes {
            if let Some(feed) = self.feeds.get_mut(symbol) {
                feed.append_item(*close);
            }
        }
    }

    /// Latest close for a symbol
    pub fn latest(&self, symbol: &str) -> Option<Decimal> {
        self.feeds.get(symbol).and_then(Feed::latest)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.feeds.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Feed> {
        self.feeds.iter()
    }

    /// Number of instruments
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Shared length of all feeds
    ///
    /// Fails with [`BacktestError::MismatchedFeedLength`] naming the first feed
    /// whose length differs from the first symbol's.
    pub fn common_len(&self) -> BacktestResult<usize> {
        shared_len(self.feeds.iter().map(|(symbol, feed)| (symbol, feed.len())))
    }
}

impl<'a> IntoIterator for &'a FeedSet {
    type Item = (&'a String, &'a Feed);
    type IntoIter = btree_map::Iter<'a, String, Feed>;

    fn into_iter(self) -> Self::IntoIter {
        self.feeds.iter()
    }
}

impl FromIterator<(String, Feed)> for FeedSet {
    fn from_iter<T: IntoIterator<Item = (String, Feed)>>(iter: T) -> Self {
        Self {
            feeds: iter.into_iter().collect(),
        }
    }
}
