//! Portfolio holdings and their indicator annotations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub name: String,
    pub quantity: f64,
    pub average_cost: f64,
    pub current_price: f64,
    pub sma200: f64,
    pub ema_trend: f64,
    pub recommendation: String,
}

impl Holding {
    /// A freshly added holding with no analysis yet.
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            quantity: 0.0,
            average_cost: 0.0,
            current_price: 0.0,
            sma200: 0.0,
            ema_trend: 0.0,
            recommendation: String::new(),
        }
    }

    pub fn below_ma(&self) -> bool {
        self.current_price < self.sma200
    }

    pub fn market_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    pub fn cost_basis(&self) -> f64 {
        self.average_cost * self.quantity
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.market_value() - self.cost_basis()
    }
}

/// Sorts holdings by ticker so every reduction over them is reproducible.
pub fn sort_by_ticker(holdings: &mut [Holding]) {
    holdings.sort_by(|a, b| a.ticker.cmp(&b.ticker));
}
