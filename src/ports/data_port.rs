//! Data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::PairtraderError;
use chrono::NaiveDateTime;

pub trait DataPort {
    fn fetch_klines(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, PairtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, PairtraderError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, PairtraderError>;

    /// Resolve a pair symbol into its (base, quote) asset names.
    fn asset_names(&self, symbol: &str) -> Result<(String, String), PairtraderError>;
}
