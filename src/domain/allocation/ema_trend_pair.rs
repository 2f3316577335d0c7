//! EMA-trend pair selection: symbolic sell of the weakest trend, buys of the
//! two strongest. Logging-only, needs at least three holdings.
//!
//! Selection is a single pass in ticker order with strict comparisons, so the
//! first holding encountered wins a tie.

use super::{AllocationDecision, AllocationInput, StrategyTag, quantity_for};
use crate::domain::holding::Holding;

pub const MIN_HOLDINGS: usize = 3;

/// Marker quantity for the symbolic one-unit sell.
pub const SELL_QUANTITY: f64 = -1.0;

#[derive(Debug, Clone, Copy)]
pub struct TrendSelection<'a> {
    pub most_negative: &'a Holding,
    pub first_positive: &'a Holding,
    pub second_positive: Option<&'a Holding>,
}

pub fn select(holdings: &[Holding]) -> Option<TrendSelection<'_>> {
    let (head, rest) = holdings.split_first()?;

    let mut most_negative = head;
    let mut first = head;
    let mut second: Option<&Holding> = None;

    for holding in rest {
        if holding.ema_trend < most_negative.ema_trend {
            most_negative = holding;
        }
        if holding.ema_trend > first.ema_trend {
            second = Some(first);
            first = holding;
        } else if second.is_none_or(|s| holding.ema_trend > s.ema_trend) {
            second = Some(holding);
        }
    }

    Some(TrendSelection {
        most_negative,
        first_positive: first,
        second_positive: second,
    })
}

pub fn run(input: &AllocationInput<'_>) -> Vec<AllocationDecision> {
    if input.holdings.len() < MIN_HOLDINGS {
        return Vec::new();
    }
    let Some(selection) = select(input.holdings) else {
        return Vec::new();
    };

    let mut decisions = Vec::new();

    let weakest = selection.most_negative;
    if weakest.ema_trend < 0.0 {
        decisions.push(input.decision(
            weakest,
            -weakest.current_price,
            SELL_QUANTITY,
            StrategyTag::EmaTrendPair,
        ));
    }

    if let Some(second) = selection.second_positive {
        let first = selection.first_positive;
        let total_positive = first.ema_trend + second.ema_trend;
        if first.ema_trend > 0.0 && second.ema_trend > 0.0 && total_positive > 0.0 {
            for holding in [first, second] {
                let weight = holding.ema_trend / total_positive;
                let invested = input.budget * weight;
                let bought = quantity_for(invested, holding.current_price);
                decisions.push(input.decision(
                    holding,
                    invested,
                    bought,
                    StrategyTag::EmaTrendPair,
                ));
            }
        }
    }

    decisions
}
