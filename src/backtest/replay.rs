//! Tick-ordered replay over per-instrument price sources

use super::types::{shared_len, BacktestError, BacktestResult};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Positional source of close prices for one instrument
pub trait PriceSource {
    /// Number of rows
    fn len(&self) -> usize;

    /// Close price at `row`
    fn close(&self, row: usize) -> Option<Decimal>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory close series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    close: Vec<Decimal>,
}

impl PriceSeries {
    pub fn new(close: Vec<Decimal>) -> Self {
        Self { close }
    }

    pub fn as_slice(&self) -> &[Decimal] {
        &self.close
    }
}

impl From<Vec<Decimal>> for PriceSeries {
    fn from(close: Vec<Decimal>) -> Self {
        Self::new(close)
    }
}

impl FromIterator<Decimal> for PriceSeries {
    fn from_iter<T: IntoIterator<Item = Decimal>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl PriceSource for PriceSeries {
    fn len(&self) -> usize {
        self.close.len()
    }

    fn close(&self, row: usize) -> Option<Decimal> {
        self.close.get(row).copied()
    }
}

impl PriceSource for Vec<Decimal> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn close(&self, row: usize) -> Option<Decimal> {
        self.get(row).copied()
    }
}

impl<T: PriceSource + ?Sized> PriceSource for Box<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn close(&self, row: usize) -> Option<Decimal> {
        (**self).close(row)
    }
}

/// Sources keyed by symbol
pub type SourceMap = BTreeMap<String, Box<dyn PriceSource>>;

/// Shared row count of all sources
pub fn common_len<S: PriceSource>(sources: &BTreeMap<String, S>) -> BacktestResult<usize> {
    shared_len(sources.iter().map(|(symbol, source)| (symbol, source.len())))
}

/// One tick's closes, in symbol order
pub type TickCloses = Vec<(String, Decimal)>;

/// Yields the closes of every source, one tick at a time
pub struct TickStream<'a, S: PriceSource> {
    sources: &'a BTreeMap<String, S>,
    tick: usize,
    num_ticks: usize,
}

impl<'a, S: PriceSource> TickStream<'a, S> {
    /// Create a stream over the first `num_ticks` rows of each source
    pub fn new(sources: &'a BTreeMap<String, S>, num_ticks: usize) -> Self {
        Self {
            sources,
            tick: 0,
            num_ticks,
        }
    }

    fn next_tick(&mut self) -> Option<BacktestResult<(usize, TickCloses)>> {
        if self.tick >= self.num_ticks {
            return None;
        }
        let tick = self.tick;
        self.tick += 1;

        let mut closes = Vec::with_capacity(self.sources.len());
        for (symbol, source) in self.sources {
            match source.close(tick) {
                Some(price) => closes.push((symbol.clone(), price)),
                None => {
                    return Some(Err(BacktestError::MissingPrice {
                        symbol: symbol.clone(),
                        row: tick,
                    }))
                }
            }
        }
        Some(Ok((tick, closes)))
    }
}

impl<S: PriceSource> Iterator for TickStream<'_, S> {
    type Item = BacktestResult<(usize, TickCloses)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sources() -> BTreeMap<String, PriceSeries> {
        let mut sources = BTreeMap::new();
        sources.insert("B".to_string(), PriceSeries::new(vec![dec!(50), dec!(51)]));
        sources.insert("A".to_string(), PriceSeries::new(vec![dec!(100), dec!(101)]));
        sources
    }

    #[test]
    fn test_tick_stream_order() {
        let sources = sources();
        let ticks: Vec<_> = TickStream::new(&sources, 2)
            .collect::<BacktestResult<Vec<_>>>()
            .unwrap();

        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].0, 0);
        assert_eq!(
            ticks[1].1,
            vec![("A".to_string(), dec!(101)), ("B".to_string(), dec!(51))]
        );
    }

    #[test]
    fn test_tick_stream_missing_row() {
        let sources = sources();
        let result: BacktestResult<Vec<_>> = TickStream::new(&sources, 3).collect();
        assert_eq!(
            result.unwrap_err(),
            BacktestError::MissingPrice {
                symbol: "A".to_string(),
                row: 2
            }
        );
    }

    #[test]
    fn test_common_len_mismatch() {
        let mut sources = sources();
        sources.insert("C".to_string(), PriceSeries::new(vec![dec!(1)]));
        assert!(matches!(
            common_len(&sources),
            Err(BacktestError::MismatchedFeedLength { actual: 1, .. })
        ));
    }

    #[test]
    fn test_common_len_empty() {
        let sources: BTreeMap<String, PriceSeries> = BTreeMap::new();
        assert_eq!(common_len(&sources).unwrap_err(), BacktestError::NoFeeds);
    }

    #[test]
    fn test_boxed_source() {
        let boxed: Box<dyn PriceSource> = Box::new(PriceSeries::new(vec![dec!(1), dec!(2)]));
        assert_eq!(boxed.len(), 2);
        assert_eq!(boxed.close(1), Some(dec!(2)));
        assert!(!boxed.is_empty());
    }
}
