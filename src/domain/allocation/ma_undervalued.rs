//! MA-undervalued weighted allocation.
//!
//! Eligible: below SMA200, SMA200 > 0 and price > 0.
//! score = SMA200 - price, weight = score / sum(score), invested = budget * weight.
//! Bought shares update the holding's running average cost and quantity.

use super::{AllocationDecision, AllocationInput, StrategyTag, quantity_for, round2};
use crate::domain::holding::Holding;

#[derive(Debug, Clone, PartialEq)]
pub struct MaUndervaluedOutcome {
    pub decisions: Vec<AllocationDecision>,
    pub holdings: Vec<Holding>,
    pub rolled_over: bool,
}

pub fn is_eligible(holding: &Holding) -> bool {
    holding.below_ma() && holding.sma200 > 0.0 && holding.current_price > 0.0
}

pub fn score(holding: &Holding) -> f64 {
    holding.sma200 - holding.current_price
}

pub fn recommendation_text(invested: f64) -> String {
    format!("Invest €{:.2}", invested)
}

pub fn run(input: &AllocationInput<'_>) -> MaUndervaluedOutcome {
    let mut holdings = input.holdings.to_vec();

    let total_score: f64 = holdings
        .iter()
        .filter(|h| is_eligible(h))
        .map(score)
        .sum();

    let any_eligible = holdings.iter().any(is_eligible);
    if !any_eligible || total_score <= 0.0 {
        return MaUndervaluedOutcome {
            decisions: Vec::new(),
            holdings,
            rolled_over: true,
        };
    }

    let mut decisions = Vec::new();
    for holding in holdings.iter_mut() {
        if !is_eligible(holding) {
            holding.recommendation.clear();
            continue;
        }

        let weight = score(holding) / total_score;
        let invested = input.budget * weight;
        let bought = quantity_for(invested, holding.current_price);

        decisions.push(input.decision(holding, invested, bought, StrategyTag::MaUndervalued));
        apply_purchase(holding, invested, bought);
        holding.recommendation = recommendation_text(invested);
    }

    MaUndervaluedOutcome {
        decisions,
        holdings,
        rolled_over: false,
    }
}

/// Folds a purchase into the running average cost. The average is computed on
/// the unrounded total; the stored quantity is rounded to 2 decimals.
fn apply_purchase(holding: &mut Holding, invested: f64, bought: f64) {
    let new_quantity = holding.quantity + bought;
    if new_quantity == 0.0 {
        return;
    }
    holding.average_cost = (holding.cost_basis() + invested) / new_quantity;
    holding.quantity = round2(new_quantity);
}
