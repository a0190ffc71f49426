//! INI file configuration adapter.

use crate::domain::error::PairtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PairtraderError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|e| PairtraderError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, PairtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| PairtraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
source = csv
path = ./data

[backtest]
symbol = BTCUSDT
start = 2022-02-01 00:00:00
end = 2022-03-01 00:00:00

[wallet]
a = 0.0
b = 1000.0

[strategy]
name = simple-threshold
alpha = 0.5
delta = 0.05
reverse = true
big_window = 30
"#;

    #[test]
    fn from_string_parses_all_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();

        assert_eq!(adapter.get_string("data", "source"), Some("csv".to_string()));
        assert_eq!(
            adapter.get_string("backtest", "symbol"),
            Some("BTCUSDT".to_string())
        );
        assert_eq!(adapter.get_double("wallet", "b", 0.0), 1000.0);
        assert_eq!(adapter.get_double("strategy", "alpha", 0.0), 0.5);
        assert_eq!(adapter.get_int("strategy", "big_window", 0), 30);
        assert!(adapter.get_bool("strategy", "reverse", false));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn numeric_getters_fall_back_to_default() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nalpha = huge\n").unwrap();
        assert_eq!(adapter.get_double("strategy", "alpha", 0.25), 0.25);
        assert_eq!(adapter.get_int("strategy", "big_window", 30), 30);
    }

    #[test]
    fn bool_getter_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\na = yes\nb = 0\nc = maybe\n").unwrap();
        assert!(adapter.get_bool("strategy", "a", false));
        assert!(!adapter.get_bool("strategy", "b", true));
        assert!(adapter.get_bool("strategy", "c", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("simple-threshold".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/pairtrader.ini");
        assert!(matches!(
            result,
            Err(PairtraderError::ConfigParse { .. })
        ));
    }
}
