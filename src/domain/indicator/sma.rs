//! Simple Moving Average over the most recent closes.
//!
//! SMA(n) = sum(C[0..n]) / n with C newest-first.

use crate::domain::error::TrendfolioError;
use crate::domain::indicator::{IndicatorType, require_len};
use crate::domain::price::PriceSeries;

pub fn compute_sma(series: &PriceSeries, period: usize) -> Result<f64, TrendfolioError> {
    require_len(series, IndicatorType::Sma(period))?;

    let closes = series.closes_newest_first();
    let sum: f64 = closes[..period].iter().sum();
    Ok(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::{PricePoint, SeriesOrder};
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn newest_first(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start - Duration::days(i as i64),
                close,
            })
            .collect();
        PriceSeries::new("TEST", points, SeriesOrder::NewestFirst)
    }

    #[test]
    fn sma_uses_most_recent_closes() {
        let series = newest_first(&[30.0, 20.0, 10.0, 1000.0]);
        let sma = compute_sma(&series, 3).unwrap();
        assert_relative_eq!(sma, 20.0);
    }

    #[test]
    fn sma_accepts_oldest_first_input() {
        let series = newest_first(&[30.0, 20.0, 10.0, 1000.0]).oldest_first();
        let sma = compute_sma(&series, 3).unwrap();
        assert_relative_eq!(sma, 20.0);
    }

    #[test]
    fn sma_identical_closes() {
        let series = newest_first(&[42.5; 200]);
        assert_eq!(compute_sma(&series, 200).unwrap(), 42.5);
    }

    #[test]
    fn sma_exact_length() {
        let series = newest_first(&[4.0, 2.0]);
        assert_relative_eq!(compute_sma(&series, 2).unwrap(), 3.0);
    }

    #[test]
    fn sma_insufficient_data() {
        let series = newest_first(&[1.0, 2.0, 3.0]);
        match compute_sma(&series, 4) {
            Err(TrendfolioError::InsufficientData {
                indicator,
                points,
                minimum,
            }) => {
                assert_eq!(indicator, "SMA(4)");
                assert_eq!(points, 3);
                assert_eq!(minimum, 4);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn sma_period_zero_is_rejected() {
        let empty = newest_first(&[]);
        assert!(compute_sma(&empty, 0).is_err());

        let series = newest_first(&[3.0, 2.0, 1.0]);
        match compute_sma(&series, 0) {
            Err(TrendfolioError::InsufficientData { points, minimum, .. }) => {
                assert_eq!(points, 3);
                assert_eq!(minimum, 1);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn sma_strictly_inside_increasing_window(
            start in 1.0f64..500.0,
            steps in proptest::collection::vec(0.01f64..10.0, 2..60),
        ) {
            let mut oldest_first = vec![start];
            for step in &steps {
                let last = *oldest_first.last().unwrap();
                oldest_first.push(last + step);
            }
            let closes: Vec<f64> = oldest_first.iter().rev().copied().collect();
            let period = closes.len();
            let sma = compute_sma(&newest_first(&closes), period).unwrap();

            let min = oldest_first[0];
            let max = *oldest_first.last().unwrap();
            prop_assert!(sma > min && sma < max);
        }
    }
}
