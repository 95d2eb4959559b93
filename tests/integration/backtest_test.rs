//! Integration tests for the replay engine

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tick_backtest::backtest::{
    Backtest, BacktestConfig, BacktestError, BacktestResult, FeedSet, PositionMap, PriceSeries,
    RecordingChart, SourceMap,
};
use tick_backtest::strategy::{HoldStrategy, SmaCrossStrategy, Strategy};

/// Plays back a fixed sequence of position maps
struct Scripted {
    maps: Vec<PositionMap>,
    tick: usize,
}

impl Scripted {
    fn new(maps: Vec<PositionMap>) -> Self {
        Self { maps, tick: 0 }
    }
}

impl Strategy for Scripted {
    fn make_decision(&mut self, _feeds: &FeedSet) -> BacktestResult<PositionMap> {
        let map = self.maps.get(self.tick).cloned().unwrap_or_default();
        self.tick += 1;
        Ok(map)
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Fails on the given tick
struct FailsAt(usize, usize);

impl Strategy for FailsAt {
    fn make_decision(&mut self, _feeds: &FeedSet) -> BacktestResult<PositionMap> {
        self.1 += 1;
        if self.1 > self.0 {
            return Err(BacktestError::Strategy("model unavailable".to_string()));
        }
        Ok(PositionMap::new())
    }
}

fn flat_prices(n: usize) -> PriceSeries {
    PriceSeries::new(vec![dec!(10); n])
}

fn single(symbol: &str, quantity: Decimal) -> PositionMap {
    PositionMap::new().with(symbol, quantity)
}

fn run_scripted(maps: Vec<PositionMap>, commission_rate: Decimal) -> tick_backtest::backtest::BacktestReport {
    let n = maps.len();
    let config = BacktestConfig {
        commission_rate,
        ..BacktestConfig::default()
    };
    let mut backtest = Backtest::new(SourceMap::new(), Box::new(Scripted::new(maps)), config)
        .with_source("A", flat_prices(n))
        .with_source("B", flat_prices(n));
    backtest.run(None).unwrap()
}

#[test]
fn test_scenario_two_instruments() {
    let mut backtest = Backtest::new(
        SourceMap::new(),
        Box::new(HoldStrategy::new(single("A", dec!(1)))),
        BacktestConfig::default(),
    )
    .with_source("A", PriceSeries::new(vec![dec!(100), dec!(101), dec!(99)]))
    .with_source("B", PriceSeries::new(vec![dec!(50), dec!(50), dec!(51)]));

    let report = backtest.run(None).unwrap();

    assert_eq!(report.daily_profit, vec![dec!(-0.04), dec!(1), dec!(-2)]);
    assert_eq!(report.metrics.total_profit, dec!(-1.04));
    assert_eq!(report.metrics.num_trades, 0);
    assert_eq!(report.positions, vec![single("A", dec!(1)); 3]);
    assert_eq!(
        report.cumulative_profit(),
        vec![dec!(0), dec!(-0.04), dec!(0.96), dec!(-1.04)]
    );
}

#[test]
fn test_trade_count_matches_map_changes() {
    let a = single("A", dec!(1));
    let b = single("B", dec!(-1));
    let both = single("A", dec!(1)).with("B", dec!(-1));
    let flat = PositionMap::new();

    let cases: Vec<(Vec<PositionMap>, usize)> = vec![
        (vec![a.clone(), a.clone()], 0),
        (vec![a.clone(), b.clone()], 1),
        (vec![flat.clone(), a.clone(), a.clone()], 1),
        (vec![a.clone(), both.clone(), both.clone(), a.clone()], 2),
        (vec![a.clone(), b.clone(), a.clone(), b.clone(), a.clone()], 4),
        (vec![flat.clone(), single("A", dec!(0)), flat.clone()], 0),
    ];

    for (maps, expected) in cases {
        let report = run_scripted(maps.clone(), dec!(0.001));
        assert_eq!(report.metrics.num_trades, expected, "{maps:?}");
    }
}

#[test]
fn test_no_commission_on_repeated_maps() {
    let a = single("A", dec!(2));
    let b = single("B", dec!(3));
    let sequences = vec![
        vec![a.clone(), a.clone(), b.clone(), b.clone()],
        vec![PositionMap::new(), PositionMap::new(), a.clone()],
        vec![a.clone(), b.clone(), b.clone(), b.clone(), a.clone()],
    ];

    for maps in sequences {
        let report = run_scripted(maps.clone(), dec!(0.01));
        for tick in 1..maps.len() {
            if maps[tick] == maps[tick - 1] {
                assert_eq!(report.daily_profit[tick], Decimal::ZERO, "tick {tick} of {maps:?}");
            } else {
                assert!(report.daily_profit[tick] < Decimal::ZERO, "tick {tick} of {maps:?}");
            }
        }
    }
}

#[test]
fn test_flat_history_returns_zero() {
    let report = run_scripted(vec![PositionMap::new(); 4], dec!(0.01));
    assert_eq!(report.metrics.return_pct, Decimal::ZERO);
    assert_eq!(report.metrics.total_profit, Decimal::ZERO);
    assert_eq!(report.metrics.sortino_ratio, None);
}

#[test]
fn test_rerun_is_identical() {
    let closes = vec![
        dec!(100),
        dec!(102),
        dec!(101),
        dec!(97),
        dec!(98),
        dec!(103),
        dec!(99),
    ];
    let strategy = SmaCrossStrategy::new(2, 3, dec!(1.5)).unwrap().with_short(true);
    let mut backtest = Backtest::new(SourceMap::new(), Box::new(strategy), BacktestConfig::default())
        .with_source("A", PriceSeries::new(closes));

    let first = backtest.run(None).unwrap();
    let second = backtest.run(None).unwrap();

    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.positions, second.positions);
}

#[test]
fn test_strategy_error_aborts_run() {
    let mut backtest = Backtest::new(
        SourceMap::new(),
        Box::new(FailsAt(2, 0)),
        BacktestConfig::default(),
    )
    .with_source("A", flat_prices(5));

    assert_eq!(
        backtest.run(None).unwrap_err(),
        BacktestError::Strategy("model unavailable".to_string())
    );
}

#[test]
fn test_feed_compaction_does_not_affect_profit() {
    let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
    let config = BacktestConfig {
        max_feed_len: 4,
        commission_rate: Decimal::ZERO,
        ..BacktestConfig::default()
    };
    let mut backtest = Backtest::new(
        SourceMap::new(),
        Box::new(HoldStrategy::new(single("A", dec!(1)))),
        config,
    )
    .with_source("A", PriceSeries::new(closes));

    let report = backtest.run(None).unwrap();
    assert_eq!(report.metrics.total_profit, dec!(19));
    assert_eq!(report.metrics.max_position, dec!(20));
}

#[test]
fn test_chart_receives_profit_curve() {
    let mut backtest = Backtest::new(
        SourceMap::new(),
        Box::new(HoldStrategy::new(single("A", dec!(1)))),
        BacktestConfig::default(),
    )
    .with_source("A", PriceSeries::new(vec![dec!(100), dec!(101), dec!(99)]));

    let mut chart = RecordingChart::default();
    let report = backtest.run_with_chart(None, &mut chart).unwrap();

    assert_eq!(chart.profit, report.cumulative_profit());
    assert_eq!(chart.strategy.as_deref(), Some("Hold"));
    assert!(chart.panels.is_empty());
}
