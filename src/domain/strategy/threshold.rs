//! Prediction threshold rules: trade on an externally computed return forecast.

use crate::domain::price_table::SymbolSeries;
use crate::domain::strategy::SignalRules;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const DEFAULT_THRESHOLD: f64 = 0.005;

/// Buy when the forecast for a date is at least `threshold`, sell when it is
/// at most `-threshold`. Dates without a forecast never fire.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRules {
    pub threshold: f64,
    pub predictions: BTreeMap<NaiveDate, f64>,
}

impl ThresholdRules {
    pub fn new(threshold: f64, predictions: BTreeMap<NaiveDate, f64>) -> Self {
        ThresholdRules {
            threshold,
            predictions,
        }
    }

    fn mask<F>(&self, series: &SymbolSeries, fires: F) -> Vec<bool>
    where
        F: Fn(f64) -> bool,
    {
        series
            .dates
            .iter()
            .map(|d| self.predictions.get(d).is_some_and(|p| fires(*p)))
            .collect()
    }
}

impl SignalRules for ThresholdRules {
    fn evaluate_buy(&self, series: &SymbolSeries) -> Vec<bool> {
        self.mask(series, |p| p >= self.threshold)
    }

    fn evaluate_sell(&self, series: &SymbolSeries) -> Vec<bool> {
        self.mask(series, |p| p <= -self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn series(n: u32) -> SymbolSeries {
        SymbolSeries {
            symbol: "IBM".into(),
            dates: (1..=n).map(date).collect(),
            price: vec![100.0; n as usize],
            high: vec![101.0; n as usize],
            low: vec![99.0; n as usize],
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let predictions = BTreeMap::from([
            (date(1), 0.01),
            (date(2), 0.004),
            (date(3), -0.01),
            (date(4), -0.02),
        ]);
        let rules = ThresholdRules::new(0.01, predictions);
        let s = series(5);
        assert_eq!(rules.evaluate_buy(&s), vec![true, false, false, false, false]);
        assert_eq!(rules.evaluate_sell(&s), vec![false, false, true, true, false]);
        assert_eq!(rules.evaluate_exit(&s), vec![false; 5]);
    }
}
