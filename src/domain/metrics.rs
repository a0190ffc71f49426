//! Performance metrics over a completed strategy run.
//!
//! Pure functions layered on the ledger and wallet valuations; no state of
//! their own.

use chrono::Duration;

use super::candle::PriceSeries;
use super::error::PairtraderError;
use super::operation::Operation;
use super::strategy::{BacktestResult, DecisionRule, Strategy};
use super::wallet::Wallet;
use crate::ports::price_port::PricePort;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_WEEK: f64 = 7.0;
const DAYS_PER_YEAR: f64 = 365.25;

/// Wall-clock span of a series expressed in each unit. Used as the
/// denominator for rate metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periods {
    pub seconds: f64,
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
    pub weeks: f64,
    pub years: f64,
}

impl Periods {
    pub fn from_span(span: Duration) -> Self {
        let seconds = span.num_milliseconds() as f64 / 1_000.0;
        let days = seconds / SECONDS_PER_DAY;
        Periods {
            seconds,
            minutes: seconds / 60.0,
            hours: seconds / 3_600.0,
            days,
            weeks: days / DAYS_PER_WEEK,
            years: days / DAYS_PER_YEAR,
        }
    }

    pub fn of(series: &PriceSeries) -> Self {
        Self::from_span(series.span())
    }
}

/// Wallet-value return figures for one run, in percent.
///
/// The daily/weekly/yearly figures are linear extrapolations of the
/// interval return, not compounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profitability {
    pub interval: f64,
    /// Interval return per operation; `None` when no operations occurred.
    pub mean: Option<f64>,
    pub daily: f64,
    pub weekly: f64,
    pub yearly: f64,
}

impl Profitability {
    pub fn compute(
        start_value: f64,
        end_value: f64,
        operation_count: usize,
        periods: &Periods,
    ) -> Result<Self, PairtraderError> {
        if start_value == 0.0 {
            return Err(PairtraderError::DivisionByZero {
                context: "profitability (start wallet value is zero)".into(),
            });
        }
        if periods.days <= 0.0 {
            return Err(PairtraderError::DivisionByZero {
                context: "profitability (series span is zero)".into(),
            });
        }

        let interval = (end_value - start_value) / start_value * 100.0;
        let mean = if operation_count > 0 {
            Some(interval / operation_count as f64)
        } else {
            None
        };

        Ok(Profitability {
            interval,
            mean,
            daily: interval / periods.days,
            weekly: interval / periods.weeks,
            yearly: interval / periods.years,
        })
    }
}

/// Operations per hour of series span.
pub fn operations_per_hour(
    ledger: &[Operation],
    periods: &Periods,
) -> Result<f64, PairtraderError> {
    if periods.hours <= 0.0 {
        return Err(PairtraderError::DivisionByZero {
            context: "operations per hour (series span is zero)".into(),
        });
    }
    Ok(ledger.len() as f64 / periods.hours)
}

/// Mean gap between consecutive operations; `None` with fewer than two.
pub fn mean_operation_gap(ledger: &[Operation]) -> Option<Duration> {
    if ledger.len() < 2 {
        return None;
    }

    let total_ms: i64 = ledger
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds())
        .sum();

    Some(Duration::milliseconds(total_ms / (ledger.len() as i64 - 1)))
}

/// Operations whose anticipated price direction held until the next
/// operation. The last operation has no successor and counts as neither
/// good nor bad.
pub fn good_operation_count(ledger: &[Operation]) -> usize {
    ledger
        .windows(2)
        .filter(|pair| pair[0].anticipated(pair[1].price))
        .count()
}

pub fn bad_operation_count(ledger: &[Operation]) -> usize {
    ledger
        .windows(2)
        .filter(|pair| !pair[0].anticipated(pair[1].price))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketComparison {
    pub strategy_return: f64,
    pub market_return: f64,
}

/// Compare a completed run against buy-and-hold: the market return is the
/// interval profitability of a DoNothing run over the same series and
/// start wallet.
pub fn compare_to_buy_and_hold(
    series: &PriceSeries,
    start_wallet: &Wallet,
    result: &BacktestResult,
    prices: &dyn PricePort,
) -> Result<MarketComparison, PairtraderError> {
    let mut baseline = Strategy::new(
        series.clone(),
        start_wallet.clone(),
        DecisionRule::DoNothing,
    )?;
    let market = baseline.run(prices)?;

    Ok(MarketComparison {
        strategy_return: result.profitability.interval,
        market_return: market.profitability.interval,
    })
}
