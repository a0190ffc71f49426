//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDateTime;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    validate_data_source(config)?;
    validate_symbol(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_wallet_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let a = config.get_double("wallet", "a", 0.0);
    let b = config.get_double("wallet", "b", 0.0);

    if a < 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "wallet".to_string(),
            key: "a".to_string(),
            reason: "a must be non-negative".to_string(),
        });
    }
    if b < 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "wallet".to_string(),
            key: "b".to_string(),
            reason: "b must be non-negative".to_string(),
        });
    }
    if a == 0.0 && b == 0.0 {
        return Err(PairtraderError::ConfigInvalid {
            section: "wallet".to_string(),
            key: "a".to_string(),
            reason: "wallet must hold at least one non-zero balance".to_string(),
        });
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let name = match config.get_string("strategy", "name") {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            return Err(PairtraderError::ConfigMissing {
                section: "strategy".to_string(),
                key: "name".to_string(),
            })
        }
    };

    match name.trim() {
        "do-nothing" => Ok(()),
        "simple-threshold" => {
            validate_fraction(config, "alpha")?;
            validate_fraction(config, "delta")
        }
        "ma-crossover" => {
            validate_fraction(config, "alpha")?;
            validate_windows(config)
        }
        "buy-first-sell-last" => validate_fraction(config, "alpha"),
        other => Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "name".to_string(),
            reason: format!("unknown strategy '{}'", other),
        }),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let source = config.get_string("data", "source");
    match source.as_deref().map(str::trim) {
        Some("csv") | Some("sqlite") => {}
        Some(other) => {
            return Err(PairtraderError::ConfigInvalid {
                section: "data".to_string(),
                key: "source".to_string(),
                reason: format!("unknown source '{}', expected csv or sqlite", other),
            })
        }
        None => {
            return Err(PairtraderError::ConfigMissing {
                section: "data".to_string(),
                key: "source".to_string(),
            })
        }
    }

    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PairtraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(PairtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let start_str = config.get_string("backtest", "start");
    let end_str = config.get_string("backtest", "end");

    let start = parse_datetime(start_str.as_deref(), "start")?;
    let end = parse_datetime(end_str.as_deref(), "end")?;

    if start >= end {
        return Err(PairtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "start".to_string(),
            reason: "start must be before end".to_string(),
        });
    }
    Ok(())
}

pub fn parse_datetime(value: Option<&str>, field: &str) -> Result<NaiveDateTime, PairtraderError> {
    match value {
        None => Err(PairtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT).map_err(|_| {
            PairtraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD HH:MM:SS", field),
            }
        }),
    }
}

fn validate_fraction(config: &dyn ConfigPort, key: &str) -> Result<(), PairtraderError> {
    let value = config.get_double("strategy", key, 0.0);
    if !(value > 0.0 && value < 1.0) {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{} must be strictly between 0 and 1", key),
        });
    }
    Ok(())
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), PairtraderError> {
    let big = config.get_int("strategy", "big_window", 0);
    let small = config.get_int("strategy", "small_window", 0);

    if big < 1 {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "big_window".to_string(),
            reason: "big_window must be at least 1".to_string(),
        });
    }
    if small < 1 {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "small_window".to_string(),
            reason: "small_window must be at least 1".to_string(),
        });
    }
    if small >= big {
        return Err(PairtraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "small_window".to_string(),
            reason: "small_window must be smaller than big_window".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID_BACKTEST: &str = r#"
[data]
source = csv
path = ./data

[backtest]
symbol = BTCUSDT
start = 2022-02-01 00:00:00
end = 2022-03-01 00:00:00
"#;

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(VALID_BACKTEST);
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn missing_data_source_fails() {
        let config = make_config("[backtest]\nsymbol = BTCUSDT\nstart = 2022-02-01 00:00:00\nend = 2022-03-01 00:00:00\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { key, .. } if key == "source"));
    }

    #[test]
    fn unknown_data_source_fails() {
        let config = make_config("[data]\nsource = postgres\npath = x\n[backtest]\nsymbol = BTCUSDT\nstart = 2022-02-01 00:00:00\nend = 2022-03-01 00:00:00\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn missing_symbol_fails() {
        let config = make_config("[data]\nsource = csv\npath = ./data\n[backtest]\nstart = 2022-02-01 00:00:00\nend = 2022-03-01 00:00:00\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn invalid_start_format_fails() {
        let config = make_config("[data]\nsource = csv\npath = ./data\n[backtest]\nsymbol = BTCUSDT\nstart = 2022-02-01\nend = 2022-03-01 00:00:00\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "start"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config("[data]\nsource = csv\npath = ./data\n[backtest]\nsymbol = BTCUSDT\nstart = 2022-03-01 00:00:00\nend = 2022-02-01 00:00:00\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "start"));
    }

    #[test]
    fn valid_wallet_config_passes() {
        let config = make_config("[wallet]\na = 0.0\nb = 1000.0\n");
        assert!(validate_wallet_config(&config).is_ok());
    }

    #[test]
    fn negative_balance_fails() {
        let config = make_config("[wallet]\na = -1.0\nb = 1000.0\n");
        let err = validate_wallet_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "a"));
    }

    #[test]
    fn empty_wallet_fails() {
        let config = make_config("[wallet]\na = 0\nb = 0\n");
        assert!(validate_wallet_config(&config).is_err());
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            "[strategy]\nname = simple-threshold\nalpha = 0.5\ndelta = 0.05\nreverse = false\n",
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn do_nothing_needs_no_parameters() {
        let config = make_config("[strategy]\nname = do-nothing\n");
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn missing_strategy_name_fails() {
        let config = make_config("[strategy]\nalpha = 0.5\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigMissing { key, .. } if key == "name"));
    }

    #[test]
    fn unknown_strategy_name_fails() {
        let config = make_config("[strategy]\nname = martingale\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "name"));
    }

    #[test]
    fn alpha_out_of_range_fails() {
        let config = make_config("[strategy]\nname = buy-first-sell-last\nalpha = 1.0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "alpha"));
    }

    #[test]
    fn missing_delta_fails_for_threshold() {
        let config = make_config("[strategy]\nname = simple-threshold\nalpha = 0.5\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "delta"));
    }

    #[test]
    fn windows_validated_for_crossover() {
        let config = make_config(
            "[strategy]\nname = ma-crossover\nalpha = 0.2\nbig_window = 5\nsmall_window = 5\n",
        );
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, PairtraderError::ConfigInvalid { key, .. } if key == "small_window"));
    }

    #[test]
    fn valid_crossover_config_passes() {
        let config = make_config(
            "[strategy]\nname = ma-crossover\nalpha = 0.2\nbig_window = 30\nsmall_window = 5\n",
        );
        assert!(validate_strategy_config(&config).is_ok());
    }
}
