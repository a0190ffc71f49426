//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::series_price_adapter::SeriesPriceAdapter;
use crate::domain::candle::PriceSeries;
use crate::domain::config_validation::{
    parse_datetime, validate_backtest_config, validate_strategy_config, validate_wallet_config,
};
use crate::domain::error::PairtraderError;
use crate::domain::metrics::compare_to_buy_and_hold;
use crate::domain::strategy::{BacktestResult, DecisionRule, Strategy};
use crate::domain::wallet::Wallet;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "pairtrader", about = "Trade-simulation backtester for asset pairs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in the data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for the configured symbol(s)
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a backtest configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, symbol.as_deref())
            }
        }
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { symbol, config } => run_info(symbol.as_deref(), &config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn make_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, PairtraderError> {
    let source = config
        .get_string("data", "source")
        .ok_or_else(|| PairtraderError::ConfigMissing {
            section: "data".into(),
            key: "source".into(),
        })?;

    match source.trim() {
        "csv" => {
            let path =
                config
                    .get_string("data", "path")
                    .ok_or_else(|| PairtraderError::ConfigMissing {
                        section: "data".into(),
                        key: "path".into(),
                    })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(path))))
        }
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Ok(Box::new(SqliteAdapter::from_config(config)?))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(PairtraderError::ConfigInvalid {
                    section: "data".into(),
                    key: "source".into(),
                    reason: "sqlite support is not compiled in".into(),
                })
            }
        }
        other => Err(PairtraderError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}', expected csv or sqlite", other),
        }),
    }
}

/// Build the decision rule from the `[strategy]` section. Defaults mirror
/// the interactive tool this replaces: alpha 0.5, delta 0.05, windows 30/5.
pub fn build_decision_rule(adapter: &dyn ConfigPort) -> Result<DecisionRule, PairtraderError> {
    let name =
        adapter
            .get_string("strategy", "name")
            .ok_or_else(|| PairtraderError::ConfigMissing {
                section: "strategy".into(),
                key: "name".into(),
            })?;

    let rule = match name.trim() {
        "do-nothing" => DecisionRule::DoNothing,
        "simple-threshold" => DecisionRule::SimpleThreshold {
            alpha: adapter.get_double("strategy", "alpha", 0.5),
            delta: adapter.get_double("strategy", "delta", 0.05),
            reverse: adapter.get_bool("strategy", "reverse", false),
        },
        "ma-crossover" => DecisionRule::MovingAverageCrossover {
            big_window: adapter.get_int("strategy", "big_window", 30) as usize,
            small_window: adapter.get_int("strategy", "small_window", 5) as usize,
            alpha: adapter.get_double("strategy", "alpha", 0.5),
        },
        "buy-first-sell-last" => DecisionRule::BuyFirstSellLast {
            alpha: adapter.get_double("strategy", "alpha", 0.5),
        },
        other => {
            return Err(PairtraderError::ConfigInvalid {
                section: "strategy".into(),
                key: "name".into(),
                reason: format!("unknown strategy '{}'", other),
            })
        }
    };

    rule.validate()?;
    Ok(rule)
}

fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, PairtraderError> {
    if let Some(s) = symbol_override {
        return Ok(s.to_uppercase());
    }
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_uppercase()),
        _ => Err(PairtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        }),
    }
}

fn run_backtest(config_path: &PathBuf, symbol_override: Option<&str>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    for validation in [
        validate_backtest_config(&adapter),
        validate_wallet_config(&adapter),
        validate_strategy_config(&adapter),
    ] {
        if let Err(e) = validation {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    // Stage 2: Resolve symbol and data source
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = match make_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let (base_asset, quote_asset) = match data_port.asset_names(&symbol) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Fetch klines for the configured window
    let start = match parse_datetime(adapter.get_string("backtest", "start").as_deref(), "start") {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let end = match parse_datetime(adapter.get_string("backtest", "end").as_deref(), "end") {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Fetching {} klines, {} to {}", symbol, start, end);
    let candles = match data_port.fetch_klines(&symbol, start, end) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if candles.is_empty() {
        let e = PairtraderError::NoData { symbol };
        eprintln!("error: {e}");
        return (&e).into();
    }

    let series = match PriceSeries::new(candles) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Assemble wallet, rule and price oracle
    let start_wallet = Wallet::new(
        symbol.clone(),
        base_asset,
        quote_asset,
        adapter.get_double("wallet", "a", 0.0),
        adapter.get_double("wallet", "b", 0.0),
    );

    let rule = match build_decision_rule(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Running strategy: {}", rule.name());

    let prices = SeriesPriceAdapter::for_wallet(&start_wallet, series.clone());

    // Stage 5: Run
    let mut strategy = match Strategy::new(series.clone(), start_wallet.clone(), rule) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let result = match strategy.run(&prices) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 6: Print ledger to stdout, metrics panel to stderr
    for op in result.operations() {
        println!(
            "{} {} {:.8} {} @ {:.8}",
            op.timestamp,
            op.side,
            op.quantity_b,
            start_wallet.asset_b,
            op.price
        );
    }

    match print_summary(&symbol, &series, &start_wallet, &result, &prices) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn print_summary(
    symbol: &str,
    series: &PriceSeries,
    start_wallet: &Wallet,
    result: &BacktestResult,
    prices: &SeriesPriceAdapter,
) -> Result<(), PairtraderError> {
    use crate::ports::price_port::PricePort as _;

    let first_ts = series.first().timestamp;
    let last_ts = series.last().timestamp;
    let start_value = start_wallet.value_in(prices, Some(first_ts))?;
    let end_value = result.end_wallet.value_in(prices, Some(last_ts))?;
    let market = compare_to_buy_and_hold(series, start_wallet, result, prices)?;

    eprintln!("\n=== Backtest Results ===");
    eprintln!("Symbol:            {}", symbol);
    eprintln!("Samples:           {}", series.len());
    eprintln!("Span:              {:.2} days", result.periods.days);
    eprintln!(
        "Operations:        {} ({} good / {} bad)",
        result.operation_count(),
        result.good_operation_count(),
        result.bad_operation_count(),
    );
    eprintln!(
        "Operations/hour:   {:.4}",
        result.operations_per_hour()?
    );
    match result.mean_operation_gap() {
        Some(gap) => eprintln!("Mean gap:          {}", format_gap(gap)),
        None => eprintln!("Mean gap:          n/a"),
    }
    eprintln!(
        "Start wallet:      {:.8} {} / {:.8} {}  ({:.2} {})",
        start_wallet.a,
        start_wallet.asset_a,
        start_wallet.b,
        start_wallet.asset_b,
        start_value,
        start_wallet.asset_b,
    );
    eprintln!(
        "End wallet:        {:.8} {} / {:.8} {}  ({:.2} {})",
        result.end_wallet.a,
        result.end_wallet.asset_a,
        result.end_wallet.b,
        result.end_wallet.asset_b,
        end_value,
        result.end_wallet.asset_b,
    );
    eprintln!("Profitability:     {:+.2}%", result.profitability.interval);
    match result.profitability.mean {
        Some(mean) => eprintln!("  per operation:   {:+.2}%", mean),
        None => eprintln!("  per operation:   n/a"),
    }
    eprintln!("  daily:           {:+.2}%", result.profitability.daily);
    eprintln!("  weekly:          {:+.2}%", result.profitability.weekly);
    eprintln!("  yearly:          {:+.2}%", result.profitability.yearly);
    eprintln!(
        "Market (hold):     {:+.2}%  (price {:+.2}% vs close)",
        market.market_return,
        (prices.price_of(&start_wallet.asset_a, Some(last_ts))?
            / prices.price_of(&start_wallet.asset_a, Some(first_ts))?
            - 1.0)
            * 100.0,
    );

    Ok(())
}

fn format_gap(gap: chrono::Duration) -> String {
    let total = gap.num_seconds();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn run_dry_run(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    for validation in [
        validate_backtest_config(&adapter),
        validate_wallet_config(&adapter),
        validate_strategy_config(&adapter),
    ] {
        if let Err(e) = validation {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    eprintln!("Config validated successfully");

    let rule = match build_decision_rule(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nStrategy:");
    eprintln!("  {:?}", rule);

    let symbol = adapter
        .get_string("backtest", "symbol")
        .unwrap_or_default();
    eprintln!("\nPair:");
    eprintln!("  symbol: {}", symbol);
    eprintln!(
        "  window: {} to {}",
        adapter.get_string("backtest", "start").unwrap_or_default(),
        adapter.get_string("backtest", "end").unwrap_or_default(),
    );

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match make_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(symbol_override: Option<&str>, config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match make_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbols = match symbol_override {
        Some(s) => vec![s.to_uppercase()],
        None => match resolve_symbol(None, &config) {
            Ok(s) => vec![s],
            Err(_) => match data_port.list_symbols() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        },
    };

    for symbol in &symbols {
        match data_port.get_data_range(symbol) {
            Ok(Some((min, max, count))) => {
                println!("{}: {} klines, {} to {}", symbol, count, min, max);
            }
            Ok(None) => {
                eprintln!("{}: no data found", symbol);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", symbol, e);
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    for validation in [
        validate_backtest_config(&adapter),
        validate_wallet_config(&adapter),
        validate_strategy_config(&adapter),
    ] {
        if let Err(e) = validation {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    match build_decision_rule(&adapter) {
        Ok(rule) => {
            eprintln!("  strategy: {}", rule.name());
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_decision_rule_threshold() {
        let config = make_config(
            "[strategy]\nname = simple-threshold\nalpha = 0.3\ndelta = 0.02\nreverse = true\n",
        );
        let rule = build_decision_rule(&config).unwrap();
        assert_eq!(
            rule,
            DecisionRule::SimpleThreshold {
                alpha: 0.3,
                delta: 0.02,
                reverse: true,
            }
        );
    }

    #[test]
    fn build_decision_rule_applies_defaults() {
        let config = make_config("[strategy]\nname = ma-crossover\n");
        let rule = build_decision_rule(&config).unwrap();
        assert_eq!(
            rule,
            DecisionRule::MovingAverageCrossover {
                big_window: 30,
                small_window: 5,
                alpha: 0.5,
            }
        );
    }

    #[test]
    fn build_decision_rule_rejects_unknown_name() {
        let config = make_config("[strategy]\nname = martingale\n");
        assert!(matches!(
            build_decision_rule(&config),
            Err(PairtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_decision_rule_validates_parameters() {
        let config = make_config("[strategy]\nname = buy-first-sell-last\nalpha = 2.0\n");
        assert!(matches!(
            build_decision_rule(&config),
            Err(PairtraderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn resolve_symbol_prefers_override() {
        let config = make_config("[backtest]\nsymbol = BTCUSDT\n");
        assert_eq!(
            resolve_symbol(Some("ethusdt"), &config).unwrap(),
            "ETHUSDT"
        );
        assert_eq!(resolve_symbol(None, &config).unwrap(), "BTCUSDT");
    }

    #[test]
    fn resolve_symbol_missing_is_error() {
        let config = make_config("[backtest]\n");
        assert!(matches!(
            resolve_symbol(None, &config),
            Err(PairtraderError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn make_data_port_unknown_source() {
        let config = make_config("[data]\nsource = parquet\npath = x\n");
        assert!(matches!(
            make_data_port(&config),
            Err(PairtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn format_gap_units() {
        assert_eq!(format_gap(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_gap(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_gap(chrono::Duration::seconds(7_325)), "2h 2m 5s");
    }
}
