//! Naive proportional baseline: spreads the budget by current market value.
//! Logging-only, holdings are never mutated.

use super::{AllocationDecision, AllocationInput, StrategyTag, quantity_for};

pub fn run(input: &AllocationInput<'_>) -> Vec<AllocationDecision> {
    let total_value: f64 = input.holdings.iter().map(|h| h.market_value()).sum();
    if total_value <= 0.0 {
        return Vec::new();
    }

    input
        .holdings
        .iter()
        .map(|holding| {
            let weight = holding.market_value() / total_value;
            let invested = input.budget * weight;
            let bought = quantity_for(invested, holding.current_price);
            input.decision(holding, invested, bought, StrategyTag::NaiveProportional)
        })
        .collect()
}
