//! Price oracle port trait.

use crate::domain::error::PairtraderError;
use chrono::NaiveDateTime;

/// Resolves the price of one unit of `asset` in the oracle's reference
/// currency at a given time (`None` means "now", i.e. the latest known
/// price). Implementations are blocking calls with no internal retry;
/// retry policy belongs to the collaborator behind the port.
pub trait PricePort {
    fn price_of(
        &self,
        asset: &str,
        at: Option<NaiveDateTime>,
    ) -> Result<f64, PairtraderError>;
}
