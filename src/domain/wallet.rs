//! Two-asset wallet tied to a trading pair.

use chrono::NaiveDateTime;

use super::error::PairtraderError;
use crate::ports::price_port::PricePort;

/// Holdings in the two assets of a pair: `a` units of the base asset and
/// `b` units of the quote asset (for BTCUSDT, A=BTC and B=USDT).
///
/// A wallet is a plain value type. Strategies copy the start wallet and
/// mutate only their own copy; the caller's wallet is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub symbol: String,
    pub asset_a: String,
    pub asset_b: String,
    pub a: f64,
    pub b: f64,
}

impl Wallet {
    pub fn new(
        symbol: impl Into<String>,
        asset_a: impl Into<String>,
        asset_b: impl Into<String>,
        a: f64,
        b: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            asset_a: asset_a.into(),
            asset_b: asset_b.into(),
            a,
            b,
        }
    }

    /// Total value of both holdings in the oracle's reference currency at
    /// `at` (`None` = latest price). Fails with `ConversionUnavailable`
    /// when the oracle cannot resolve a rate for either asset.
    pub fn value_in(
        &self,
        prices: &dyn PricePort,
        at: Option<NaiveDateTime>,
    ) -> Result<f64, PairtraderError> {
        let rate_a = prices.price_of(&self.asset_a, at)?;
        let rate_b = prices.price_of(&self.asset_b, at)?;
        Ok(self.a * rate_a + self.b * rate_b)
    }
}
