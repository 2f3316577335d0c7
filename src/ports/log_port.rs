//! Allocation log persistence port. One collection per strategy tag.

use crate::domain::allocation::{AllocationDecision, LogEntry, StrategyTag};
use crate::domain::error::TrendfolioError;

pub trait LogStore {
    /// Appends to the collection named by `decision.strategy`, returning the new id.
    fn append(&self, decision: &AllocationDecision) -> Result<i64, TrendfolioError>;

    /// Entries of one collection ordered by batch, then timestamp, ascending.
    fn list(&self, strategy: StrategyTag) -> Result<Vec<LogEntry>, TrendfolioError>;

    fn delete(&self, id: i64) -> Result<bool, TrendfolioError>;

    /// Removes every entry of `batch_id` across all collections.
    fn delete_batch(&self, batch_id: u64) -> Result<usize, TrendfolioError>;

    fn list_all(&self) -> Result<Vec<LogEntry>, TrendfolioError> {
        let mut entries = Vec::new();
        for strategy in StrategyTag::ALL {
            entries.extend(self.list(strategy)?);
        }
        Ok(entries)
    }
}
