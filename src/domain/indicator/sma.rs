//! Simple moving average of the close price.

use super::{IndicatorPoint, IndicatorSeries};
use crate::domain::candle::Candle;

/// Rolling mean of `close` over a trailing `window` of samples.
///
/// Emits one point per candle; points before the window fills are invalid.
/// A zero window or a series shorter than the window yields all-invalid
/// points (no value ever becomes defined).
pub fn calc_sma(candles: &[Candle], window: usize) -> IndicatorSeries {
    let mut values: Vec<IndicatorPoint> = Vec::with_capacity(candles.len());

    if window == 0 {
        for candle in candles {
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: 0.0,
            });
        }
        return IndicatorSeries { window, values };
    }

    let mut running_sum = 0.0_f64;

    for (i, candle) in candles.iter().enumerate() {
        running_sum += candle.close;
        if i >= window {
            running_sum -= candles[i - window].close;
        }

        if i + 1 >= window {
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: true,
                value: running_sum / window as f64,
            });
        } else {
            values.push(IndicatorPoint {
                timestamp: candle.timestamp,
                valid: false,
                value: 0.0,
            });
        }
    }

    IndicatorSeries { window, values }
}
