//! Recurring cash budget and batch numbering.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BUDGET_AMOUNT: f64 = 100.0;
pub const FIRST_BATCH_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetState {
    pub amount: f64,
    pub next_batch_id: u64,
}

impl Default for BudgetState {
    fn default() -> Self {
        Self {
            amount: DEFAULT_BUDGET_AMOUNT,
            next_batch_id: FIRST_BATCH_ID,
        }
    }
}

impl BudgetState {
    /// State after a completed allocation run: budget refilled, batch advanced.
    pub fn replenished(&self, replenish_amount: f64) -> Self {
        Self {
            amount: replenish_amount,
            next_batch_id: self.next_batch_id + 1,
        }
    }

    pub fn with_amount(&self, amount: f64) -> Self {
        Self {
            amount,
            next_batch_id: self.next_batch_id,
        }
    }
}

/// Parses a user-entered amount. Accepts a decimal comma ("12,50");
/// anything unparseable, negative or non-finite becomes 0.
pub fn parse_amount(input: &str) -> f64 {
    match input.trim().replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// True when the input is a well-formed zero ("0", "0.0", "0,00").
pub fn is_zero_amount(input: &str) -> bool {
    input.trim().replace(',', ".").parse::<f64>() == Ok(0.0)
}
