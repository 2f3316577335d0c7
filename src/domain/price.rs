//! Daily close series as delivered by the quote provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Direction of a [`PriceSeries`]. Quote providers deliver `NewestFirst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
    pub order: SeriesOrder,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, points: Vec<PricePoint>, order: SeriesOrder) -> Self {
        Self {
            ticker: ticker.into(),
            points,
            order,
        }
    }

    /// Builds a series from unordered points, sorting newest-first and
    /// keeping the first point seen for a duplicated date.
    pub fn from_unordered(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by(|a, b| b.date.cmp(&a.date));
        points.dedup_by(|later, earlier| later.date == earlier.date);
        Self::new(ticker, points, SeriesOrder::NewestFirst)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn newest_first(mut self) -> Self {
        if self.order == SeriesOrder::OldestFirst {
            self.points.reverse();
            self.order = SeriesOrder::NewestFirst;
        }
        self
    }

    pub fn oldest_first(mut self) -> Self {
        if self.order == SeriesOrder::NewestFirst {
            self.points.reverse();
            self.order = SeriesOrder::OldestFirst;
        }
        self
    }

    /// Close of the most recent point regardless of order.
    pub fn latest_close(&self) -> Option<f64> {
        match self.order {
            SeriesOrder::NewestFirst => self.points.first(),
            SeriesOrder::OldestFirst => self.points.last(),
        }
        .map(|p| p.close)
    }

    /// Keeps only the `window` most recent points.
    pub fn truncate_to_window(&mut self, window: usize) {
        match self.order {
            SeriesOrder::NewestFirst => self.points.truncate(window),
            SeriesOrder::OldestFirst => {
                let excess = self.points.len().saturating_sub(window);
                self.points.drain(..excess);
            }
        }
    }

    /// Closes in newest-first order.
    pub fn closes_newest_first(&self) -> Vec<f64> {
        let closes = self.points.iter().map(|p| p.close);
        match self.order {
            SeriesOrder::NewestFirst => closes.collect(),
            SeriesOrder::OldestFirst => closes.rev().collect(),
        }
    }
}
