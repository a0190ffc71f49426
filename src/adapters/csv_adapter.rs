//! CSV kline data adapter.
//!
//! Reads one file per pair, named `<SYMBOL>.csv`, with the columns
//! `dateTime,open,high,low,close,volume` and timestamps formatted as
//! `YYYY-MM-DD HH:MM:SS`.

use crate::domain::candle::Candle;
use crate::domain::config_validation::DATETIME_FORMAT;
use crate::domain::error::PairtraderError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

/// Quote assets recognized when splitting a pair symbol, longest first so
/// e.g. BTCUSDT resolves as BTC/USDT and not BTC/USD-with-a-T-left-over.
const KNOWN_QUOTES: &[&str] = &["USDT", "BUSD", "USDC", "TUSD", "BTC", "ETH", "BNB", "EUR"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Candle>, PairtraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| PairtraderError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PairtraderError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| PairtraderError::Database {
                reason: "missing dateTime column".into(),
            })?;
            let timestamp =
                NaiveDateTime::parse_from_str(ts_str, DATETIME_FORMAT).map_err(|e| {
                    PairtraderError::Database {
                        reason: format!("invalid dateTime value: {}", e),
                    }
                })?;

            candles.push(Candle {
                timestamp,
                open: parse_column(&record, 1, "open")?,
                high: parse_column(&record, 2, "high")?,
                low: parse_column(&record, 3, "low")?,
                close: parse_column(&record, 4, "close")?,
                volume: parse_column(&record, 5, "volume")?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

fn parse_column(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, PairtraderError> {
    record
        .get(index)
        .ok_or_else(|| PairtraderError::Database {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| PairtraderError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_klines(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, PairtraderError> {
        let candles = self.read_all(symbol)?;
        Ok(candles
            .into_iter()
            .filter(|c| c.timestamp >= start && c.timestamp <= end)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PairtraderError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PairtraderError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError> {
        let candles = self.read_all(symbol)?;
        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => {
                Ok(Some((first.timestamp, last.timestamp, candles.len())))
            }
            _ => Ok(None),
        }
    }

    fn asset_names(&self, symbol: &str) -> Result<(String, String), PairtraderError> {
        for quote in KNOWN_QUOTES {
            if let Some(base) = symbol.strip_suffix(quote) {
                if !base.is_empty() {
                    return Ok((base.to_string(), quote.to_string()));
                }
            }
        }
        Err(PairtraderError::UnknownSymbol {
            symbol: symbol.to_string(),
        })
    }
}
