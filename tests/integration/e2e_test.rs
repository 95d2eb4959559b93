//! End-to-end tests: configuration through to metrics

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tick_backtest::backtest::{Backtest, PriceSeries, SourceMap};
use tick_backtest::config::{Config, StrategyConfig};

#[test]
fn test_hold_config_end_to_end() {
    let toml = r#"
        [backtest]
        commission_rate = 0.0004

        [strategy]
        kind = "hold"
        positions = { A = 1 }

        [telemetry]
        log_level = "info"
    "#;

    let config: Config = toml::from_str(toml).unwrap();
    assert!(matches!(config.strategy, StrategyConfig::Hold { .. }));

    let strategy = config.strategy.build(false).unwrap();
    let mut backtest = Backtest::new(SourceMap::new(), strategy, config.backtest.clone())
        .with_source("A", PriceSeries::new(vec![dec!(100), dec!(101), dec!(99)]))
        .with_source("B", PriceSeries::new(vec![dec!(50), dec!(50), dec!(51)]));

    let report = backtest.run(config.backtest.num_ticks).unwrap();
    assert_eq!(report.metrics.total_profit, dec!(-1.04));
    assert_eq!(report.metrics.num_trades, 0);
}

#[test]
fn test_sma_config_end_to_end() {
    let toml = r#"
        [strategy]
        kind = "sma_cross"
        fast = 2
        slow = 3
        quantity = 1
        allow_short = true
    "#;

    let config: Config = toml::from_str(toml).unwrap();
    let strategy = config.strategy.build(true).unwrap();

    let closes = vec![
        dec!(10),
        dec!(11),
        dec!(12),
        dec!(11),
        dec!(9),
        dec!(8),
        dec!(9),
        dec!(11),
    ];
    let mut backtest = Backtest::new(SourceMap::new(), strategy, config.backtest.clone())
        .with_source("X", PriceSeries::new(closes));

    let report = backtest.run(None).unwrap();
    assert_eq!(report.positions.len(), 8);
    assert_eq!(report.daily_profit.len(), 8);
    // Flat until the slow window fills, then long, short and long again
    assert!(report.positions[0].is_flat());
    assert!(report.positions[1].is_flat());
    assert!(report.metrics.num_trades >= 2);
    assert_eq!(
        report.metrics.total_profit,
        report.daily_profit.iter().copied().sum::<Decimal>()
    );
}
