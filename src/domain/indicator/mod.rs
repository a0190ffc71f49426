//! Indicator series types.
//!
//! Points carry a `valid` flag: a rolling window emits one point per input
//! sample, flagged invalid until the window has filled.

pub mod sma;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub window: usize,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Index of the first valid point, if any window ever filled.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}
