//! Holdings persistence port.

use crate::domain::error::TrendfolioError;
use crate::domain::holding::Holding;

pub trait HoldingStore {
    fn load_all(&self) -> Result<Vec<Holding>, TrendfolioError>;

    /// Inserts or replaces the holding keyed by its ticker.
    fn save(&self, holding: &Holding) -> Result<(), TrendfolioError>;

    /// Returns whether a holding was removed.
    fn delete(&self, ticker: &str) -> Result<bool, TrendfolioError>;
}
