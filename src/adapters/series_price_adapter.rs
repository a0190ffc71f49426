//! Price oracle backed by the backtest's own kline series.
//!
//! Wallet valuations are expressed in the pair's quote asset: the quote
//! converts at 1.0, the base converts at the close of the latest sample
//! at-or-before the requested time. Any other asset has no rate.

use crate::domain::candle::PriceSeries;
use crate::domain::error::PairtraderError;
use crate::domain::wallet::Wallet;
use crate::ports::price_port::PricePort;
use chrono::NaiveDateTime;

pub struct SeriesPriceAdapter {
    base_asset: String,
    quote_asset: String,
    series: PriceSeries,
}

impl SeriesPriceAdapter {
    pub fn new(
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
        series: PriceSeries,
    ) -> Self {
        Self {
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            series,
        }
    }

    pub fn for_wallet(wallet: &Wallet, series: PriceSeries) -> Self {
        Self::new(wallet.asset_a.clone(), wallet.asset_b.clone(), series)
    }
}

impl PricePort for SeriesPriceAdapter {
    fn price_of(
        &self,
        asset: &str,
        at: Option<NaiveDateTime>,
    ) -> Result<f64, PairtraderError> {
        if asset == self.quote_asset {
            return Ok(1.0);
        }
        if asset != self.base_asset {
            return Err(PairtraderError::ConversionUnavailable {
                asset: asset.to_string(),
                at,
            });
        }

        let candle = match at {
            None => self.series.last(),
            Some(t) => self
                .series
                .candles()
                .iter()
                .rev()
                .find(|c| c.timestamp <= t)
                .ok_or(PairtraderError::ConversionUnavailable {
                    asset: asset.to_string(),
                    at,
                })?,
        };

        Ok(candle.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 2, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series() -> PriceSeries {
        let candles = [(1, 100.0), (3, 105.0), (5, 98.0)]
            .iter()
            .map(|&(day, close)| Candle {
                timestamp: ts(day),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
            })
            .collect();
        PriceSeries::new(candles).unwrap()
    }

    fn adapter() -> SeriesPriceAdapter {
        SeriesPriceAdapter::new("BTC", "USDT", series())
    }

    #[test]
    fn quote_asset_converts_at_one() {
        assert_eq!(adapter().price_of("USDT", None).unwrap(), 1.0);
        assert_eq!(adapter().price_of("USDT", Some(ts(1))).unwrap(), 1.0);
    }

    #[test]
    fn base_asset_uses_close_at_or_before() {
        let adapter = adapter();
        assert_eq!(adapter.price_of("BTC", Some(ts(1))).unwrap(), 100.0);
        // day 4 falls between samples: the day-3 close applies
        assert_eq!(adapter.price_of("BTC", Some(ts(4))).unwrap(), 105.0);
        assert_eq!(adapter.price_of("BTC", Some(ts(5))).unwrap(), 98.0);
    }

    #[test]
    fn base_asset_without_time_uses_latest_close() {
        assert_eq!(adapter().price_of("BTC", None).unwrap(), 98.0);
    }

    #[test]
    fn time_before_first_sample_has_no_rate() {
        let result = adapter().price_of("BTC", Some(ts(1) - chrono::Duration::hours(1)));
        assert!(matches!(
            result,
            Err(PairtraderError::ConversionUnavailable { .. })
        ));
    }

    #[test]
    fn unknown_asset_has_no_rate() {
        let result = adapter().price_of("DOGE", None);
        assert!(matches!(
            result,
            Err(PairtraderError::ConversionUnavailable { ref asset, .. }) if asset == "DOGE"
        ));
    }

    #[test]
    fn for_wallet_uses_wallet_assets() {
        let wallet = Wallet::new("BTCUSDT", "BTC", "USDT", 1.0, 0.0);
        let adapter = SeriesPriceAdapter::for_wallet(&wallet, series());
        assert_eq!(adapter.price_of("BTC", None).unwrap(), 98.0);
    }
}
