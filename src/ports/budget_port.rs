//! Budget singleton persistence port.

use crate::domain::budget::BudgetState;
use crate::domain::error::TrendfolioError;

pub trait BudgetStore {
    fn load(&self) -> Result<Option<BudgetState>, TrendfolioError>;

    fn save(&self, state: &BudgetState) -> Result<(), TrendfolioError>;
}
