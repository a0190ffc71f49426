//! Kline (candle) representation and the validated price series.

use chrono::{Duration, NaiveDateTime};

use super::error::PairtraderError;

/// Minimum number of samples a series needs before period and
/// profitability math is defined.
pub const MIN_SERIES_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered OHLC series for one symbol.
///
/// Construction enforces the invariants the engine relies on: at least
/// [`MIN_SERIES_LEN`] samples and strictly increasing timestamps. Gaps in
/// the timeline pass through unchanged. Once built, the candles are never
/// mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, PairtraderError> {
        if candles.len() < MIN_SERIES_LEN {
            return Err(PairtraderError::InsufficientSeriesLength {
                have: candles.len(),
                minimum: MIN_SERIES_LEN,
            });
        }

        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(PairtraderError::UnorderedSeries { index: i + 1 });
            }
        }

        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> &Candle {
        // non-empty by construction
        &self.candles[0]
    }

    pub fn last(&self) -> &Candle {
        &self.candles[self.candles.len() - 1]
    }

    /// Wall-clock span between the first and last sample.
    pub fn span(&self) -> Duration {
        self.last().timestamp - self.first().timestamp
    }
}
