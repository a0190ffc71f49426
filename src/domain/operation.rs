//! Buy/sell operations recorded by a strategy run.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One ledger entry. `quantity_b` is always expressed in units of the
/// quote asset B: a buy spends that much B to acquire A, a sell liquidates
/// A worth that much B. `price` is the close of the sample that triggered
/// the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub quantity_b: f64,
    pub price: f64,
}

impl Operation {
    /// Whether the price move to the next operation went the way this
    /// operation anticipated: up after a buy, down after a sell.
    pub fn anticipated(&self, next_price: f64) -> bool {
        match self.side {
            Side::Buy => next_price > self.price,
            Side::Sell => next_price < self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn op(side: Side, price: f64) -> Operation {
        Operation {
            timestamp: NaiveDate::from_ymd_opt(2022, 2, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            side,
            quantity_b: 50.0,
            price,
        }
    }

    #[test]
    fn buy_anticipates_rise() {
        assert!(op(Side::Buy, 100.0).anticipated(105.0));
        assert!(!op(Side::Buy, 100.0).anticipated(95.0));
        assert!(!op(Side::Buy, 100.0).anticipated(100.0));
    }

    #[test]
    fn sell_anticipates_fall() {
        assert!(op(Side::Sell, 100.0).anticipated(95.0));
        assert!(!op(Side::Sell, 100.0).anticipated(105.0));
        assert!(!op(Side::Sell, 100.0).anticipated(100.0));
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }
}
