//! Core domain types and logic.

pub mod candle;
pub mod wallet;
pub mod operation;
pub mod strategy;
pub mod metrics;
pub mod indicator;
pub mod config_validation;
pub mod error;
