//! Domain error types.
//!
//! The engine performs no internal recovery: every error below is raised
//! synchronously from the call that triggers it and surfaced to the caller.

use chrono::NaiveDateTime;

/// Top-level error type for pairtrader.
#[derive(Debug, thiserror::Error)]
pub enum PairtraderError {
    #[error("insufficient series length: have {have} samples, need {minimum}")]
    InsufficientSeriesLength { have: usize, minimum: usize },

    #[error("series timestamps not strictly increasing at index {index}")]
    UnorderedSeries { index: usize },

    #[error("division by zero computing {context}")]
    DivisionByZero { context: String },

    #[error("no conversion rate for asset {asset}")]
    ConversionUnavailable {
        asset: String,
        at: Option<NaiveDateTime>,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("strategy has already run")]
    AlreadyRun,

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no kline data for {symbol}")]
    NoData { symbol: String },

    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PairtraderError> for std::process::ExitCode {
    fn from(err: &PairtraderError) -> Self {
        let code: u8 = match err {
            PairtraderError::Io(_) => 1,
            PairtraderError::ConfigParse { .. }
            | PairtraderError::ConfigMissing { .. }
            | PairtraderError::ConfigInvalid { .. } => 2,
            PairtraderError::Database { .. } | PairtraderError::DatabaseQuery { .. } => 3,
            PairtraderError::InvalidParameter { .. } | PairtraderError::AlreadyRun => 4,
            PairtraderError::NoData { .. }
            | PairtraderError::UnknownSymbol { .. }
            | PairtraderError::InsufficientSeriesLength { .. }
            | PairtraderError::UnorderedSeries { .. } => 5,
            PairtraderError::DivisionByZero { .. }
            | PairtraderError::ConversionUnavailable { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
