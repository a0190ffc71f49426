#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use pairtrader::domain::candle::{Candle, PriceSeries};
use pairtrader::domain::error::PairtraderError;
use pairtrader::domain::wallet::Wallet;
use pairtrader::ports::data_port::DataPort;
use pairtrader::ports::price_port::PricePort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub assets: HashMap<String, (String, String)>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            assets: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_klines(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_assets(mut self, symbol: &str, base: &str, quote: &str) -> Self {
        self.assets
            .insert(symbol.to_string(), (base.to_string(), quote.to_string()));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_klines(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| c.timestamp >= start && c.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PairtraderError::Database {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(candles) if !candles.is_empty() => {
                let min = candles.iter().map(|c| c.timestamp).min().unwrap();
                let max = candles.iter().map(|c| c.timestamp).max().unwrap();
                Ok(Some((min, max, candles.len())))
            }
            _ => Ok(None),
        }
    }

    fn asset_names(&self, symbol: &str) -> Result<(String, String), PairtraderError> {
        self.assets
            .get(symbol)
            .cloned()
            .ok_or_else(|| PairtraderError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }
}

/// Fixed conversion rates, time-independent. Handy when a test wants
/// valuations decoupled from the kline series.
pub struct FixedPrices {
    pub rates: HashMap<String, f64>,
}

impl FixedPrices {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            rates: pairs
                .iter()
                .map(|&(asset, rate)| (asset.to_string(), rate))
                .collect(),
        }
    }
}

impl PricePort for FixedPrices {
    fn price_of(
        &self,
        asset: &str,
        at: Option<NaiveDateTime>,
    ) -> Result<f64, PairtraderError> {
        self.rates
            .get(asset)
            .copied()
            .ok_or_else(|| PairtraderError::ConversionUnavailable {
                asset: asset.to_string(),
                at,
            })
    }
}

pub fn dt(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 2, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn make_candle(day: u32, hour: u32, close: f64) -> Candle {
    Candle {
        timestamp: dt(day, hour),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
}

/// One candle per day starting 2022-02-01, closes taken from the slice.
pub fn make_series(closes: &[f64]) -> PriceSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: dt(1, 0) + chrono::Duration::days(i as i64),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        })
        .collect();
    PriceSeries::new(candles).unwrap()
}

pub fn make_wallet(a: f64, b: f64) -> Wallet {
    Wallet::new("BTCUSDT", "BTC", "USDT", a, b)
}

pub fn generate_candles(count: usize, start_price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = start_price + i as f64;
            Candle {
                timestamp: dt(1, 0) + chrono::Duration::hours(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}
