//! Strategy engine: decision rules and the single-use run loop.
//!
//! One `Strategy` owns one backtest run. The concrete behavior is a
//! [`DecisionRule`] variant; the ledger/wallet bookkeeping is shared by
//! every rule, so variants differ only in when they call the buy/sell
//! step.

use chrono::Duration;

use super::candle::{Candle, PriceSeries};
use super::error::PairtraderError;
use super::indicator::sma::calc_sma;
use super::metrics::{self, Periods, Profitability};
use super::operation::{Operation, Side};
use super::wallet::Wallet;
use crate::ports::price_port::PricePort;

/// The per-sample decision rule a [`Strategy`] applies.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionRule {
    /// Empty ledger; the end wallet is a copy of the start wallet. Doubles
    /// as the buy-and-hold market baseline.
    DoNothing,
    /// Threshold-reversal rule: sell on a `delta` move above the floating
    /// reference price, buy on a `delta` move below it, moving an `alpha`
    /// fraction of the relevant holding and rebasing the reference each
    /// time. `reverse` swaps which branch each condition triggers.
    SimpleThreshold { alpha: f64, delta: f64, reverse: bool },
    /// Trade on sign flips of `big SMA - small SMA` over the close price.
    MovingAverageCrossover {
        big_window: usize,
        small_window: usize,
        alpha: f64,
    },
    /// Buy at the first sample, sell at the last.
    BuyFirstSellLast { alpha: f64 },
}

impl DecisionRule {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionRule::DoNothing => "do-nothing",
            DecisionRule::SimpleThreshold { .. } => "simple-threshold",
            DecisionRule::MovingAverageCrossover { .. } => "ma-crossover",
            DecisionRule::BuyFirstSellLast { .. } => "buy-first-sell-last",
        }
    }

    pub fn validate(&self) -> Result<(), PairtraderError> {
        match self {
            DecisionRule::DoNothing => Ok(()),
            DecisionRule::SimpleThreshold { alpha, delta, .. } => {
                check_fraction("alpha", *alpha)?;
                check_fraction("delta", *delta)
            }
            DecisionRule::MovingAverageCrossover {
                big_window,
                small_window,
                alpha,
            } => {
                check_fraction("alpha", *alpha)?;
                if *small_window == 0 {
                    return Err(PairtraderError::InvalidParameter {
                        name: "small_window".into(),
                        reason: "must be positive".into(),
                    });
                }
                if small_window >= big_window {
                    return Err(PairtraderError::InvalidParameter {
                        name: "small_window".into(),
                        reason: format!(
                            "must be smaller than big_window ({small_window} >= {big_window})"
                        ),
                    });
                }
                Ok(())
            }
            DecisionRule::BuyFirstSellLast { alpha } => check_fraction("alpha", *alpha),
        }
    }
}

fn check_fraction(name: &str, value: f64) -> Result<(), PairtraderError> {
    // the negated form also rejects NaN
    if !(value > 0.0 && value < 1.0) {
        return Err(PairtraderError::InvalidParameter {
            name: name.into(),
            reason: format!("must be in (0, 1), got {value}"),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Initialized,
    Completed,
}

/// Single-use backtest over one series, one start wallet, one rule.
///
/// Construction validates the inputs; [`Strategy::run`] may be called
/// exactly once and fails with `AlreadyRun` thereafter.
#[derive(Debug, Clone)]
pub struct Strategy {
    series: PriceSeries,
    start_wallet: Wallet,
    rule: DecisionRule,
    state: RunState,
}

/// Immutable output of one completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub start_wallet: Wallet,
    pub end_wallet: Wallet,
    /// Chronological non-zero operations, at most one buy and one sell per
    /// sample.
    pub ledger: Vec<Operation>,
    pub periods: Periods,
    pub profitability: Profitability,
}

impl BacktestResult {
    pub fn operations(&self) -> &[Operation] {
        &self.ledger
    }

    pub fn operation_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn operations_per_hour(&self) -> Result<f64, PairtraderError> {
        metrics::operations_per_hour(&self.ledger, &self.periods)
    }

    pub fn mean_operation_gap(&self) -> Option<Duration> {
        metrics::mean_operation_gap(&self.ledger)
    }

    pub fn good_operation_count(&self) -> usize {
        metrics::good_operation_count(&self.ledger)
    }

    pub fn bad_operation_count(&self) -> usize {
        metrics::bad_operation_count(&self.ledger)
    }
}

impl Strategy {
    pub fn new(
        series: PriceSeries,
        start_wallet: Wallet,
        rule: DecisionRule,
    ) -> Result<Self, PairtraderError> {
        rule.validate()?;
        Ok(Self {
            series,
            start_wallet,
            rule,
            state: RunState::Initialized,
        })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn start_wallet(&self) -> &Wallet {
        &self.start_wallet
    }

    pub fn rule(&self) -> &DecisionRule {
        &self.rule
    }

    /// Execute the decision loop once over the full series.
    ///
    /// The start wallet and the series are never mutated; the run works on
    /// an internal wallet copy. Start and end wallet values are taken at
    /// the first and last sample timestamps respectively.
    pub fn run(&mut self, prices: &dyn PricePort) -> Result<BacktestResult, PairtraderError> {
        if self.state == RunState::Completed {
            return Err(PairtraderError::AlreadyRun);
        }
        self.state = RunState::Completed;

        let mut wallet = self.start_wallet.clone();
        let mut ledger: Vec<Operation> = Vec::new();

        match self.rule {
            DecisionRule::DoNothing => {}
            DecisionRule::SimpleThreshold {
                alpha,
                delta,
                reverse,
            } => run_simple_threshold(&self.series, &mut wallet, &mut ledger, alpha, delta, reverse),
            DecisionRule::MovingAverageCrossover {
                big_window,
                small_window,
                alpha,
            } => run_ma_crossover(
                &self.series,
                &mut wallet,
                &mut ledger,
                big_window,
                small_window,
                alpha,
            ),
            DecisionRule::BuyFirstSellLast { alpha } => {
                run_buy_first_sell_last(&self.series, &mut wallet, &mut ledger, alpha)
            }
        }

        let periods = Periods::of(&self.series);
        let start_value = self
            .start_wallet
            .value_in(prices, Some(self.series.first().timestamp))?;
        let end_value = wallet.value_in(prices, Some(self.series.last().timestamp))?;
        let profitability =
            Profitability::compute(start_value, end_value, ledger.len(), &periods)?;

        Ok(BacktestResult {
            start_wallet: self.start_wallet.clone(),
            end_wallet: wallet,
            ledger,
            periods,
            profitability,
        })
    }
}

/// Spend an `alpha` fraction of the B holding on A at this sample's close.
/// Zero-quantity steps leave no ledger entry.
fn execute_buy(wallet: &mut Wallet, ledger: &mut Vec<Operation>, candle: &Candle, alpha: f64) {
    let quantity_b = alpha * wallet.b;
    if quantity_b <= 0.0 {
        return;
    }
    wallet.a += quantity_b / candle.close;
    wallet.b *= 1.0 - alpha;
    ledger.push(Operation {
        timestamp: candle.timestamp,
        side: Side::Buy,
        quantity_b,
        price: candle.close,
    });
}

/// Liquidate an `alpha` fraction of the A holding into B at this sample's
/// close.
fn execute_sell(wallet: &mut Wallet, ledger: &mut Vec<Operation>, candle: &Candle, alpha: f64) {
    let quantity_b = alpha * wallet.a * candle.close;
    if quantity_b <= 0.0 {
        return;
    }
    wallet.a *= 1.0 - alpha;
    wallet.b += quantity_b;
    ledger.push(Operation {
        timestamp: candle.timestamp,
        side: Side::Sell,
        quantity_b,
        price: candle.close,
    });
}

fn run_simple_threshold(
    series: &PriceSeries,
    wallet: &mut Wallet,
    ledger: &mut Vec<Operation>,
    alpha: f64,
    delta: f64,
    reverse: bool,
) {
    let mut reference = series.first().close;

    for candle in series.candles() {
        let close = candle.close;
        // both conditions compare against the same reference; the sell
        // check runs first
        let broke_up = close >= reference * (1.0 + delta);
        let broke_down = close <= reference * (1.0 - delta);

        if broke_up {
            if reverse {
                execute_buy(wallet, ledger, candle, alpha);
            } else {
                execute_sell(wallet, ledger, candle, alpha);
            }
        }
        if broke_down {
            if reverse {
                execute_sell(wallet, ledger, candle, alpha);
            } else {
                execute_buy(wallet, ledger, candle, alpha);
            }
        }
        if broke_up || broke_down {
            reference = close;
        }
    }
}

fn run_ma_crossover(
    series: &PriceSeries,
    wallet: &mut Wallet,
    ledger: &mut Vec<Operation>,
    big_window: usize,
    small_window: usize,
    alpha: f64,
) {
    let candles = series.candles();
    let big = calc_sma(candles, big_window);
    let small = calc_sma(candles, small_window);

    let mut prev_sign: i8 = 0;

    for (i, candle) in candles.iter().enumerate() {
        // rows before both windows fill are dropped
        if !big.values[i].valid || !small.values[i].valid {
            continue;
        }

        let diff = big.values[i].value - small.values[i].value;
        let sign: i8 = if diff > 0.0 {
            1
        } else if diff < 0.0 {
            -1
        } else {
            // exactly zero: no trade, tracked sign unchanged
            continue;
        };

        if prev_sign == 1 && sign == -1 {
            execute_sell(wallet, ledger, candle, alpha);
        } else if prev_sign == -1 && sign == 1 {
            execute_buy(wallet, ledger, candle, alpha);
        }
        prev_sign = sign;
    }
}

fn run_buy_first_sell_last(
    series: &PriceSeries,
    wallet: &mut Wallet,
    ledger: &mut Vec<Operation>,
    alpha: f64,
) {
    execute_buy(wallet, ledger, series.first(), alpha);
    execute_sell(wallet, ledger, series.last(), alpha);
}
