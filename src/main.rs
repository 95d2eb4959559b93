use clap::Parser;
use tick_backtest::cli::{Cli, Commands};
use tick_backtest::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::example()?
        }
    };

    // Initialize telemetry
    tick_backtest::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Commission: {} ({} bps)",
                config.backtest.commission_rate,
                config.backtest.commission_rate * rust_decimal_macros::dec!(10000)
            );
            println!("  Feed capacity: {}", config.backtest.max_feed_len);
            match config.backtest.num_ticks {
                Some(n) => println!("  Ticks: {}", n),
                None => println!("  Ticks: all"),
            }
            println!(
                "  Risk-free: {} annual over {} periods",
                config.backtest.risk_free_rate, config.backtest.periods_per_year
            );
            println!("  Strategy: {:?}", config.strategy);
            println!(
                "  Logging: {} ({:?})",
                config.telemetry.log_level, config.telemetry.log_format
            );
        }
    }

    Ok(())
}
