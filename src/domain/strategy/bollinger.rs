//! Bollinger band crossing rules, optionally combined with MACD exits.

use crate::domain::indicator::{
    DEFAULT_BOLLINGER_WINDOW, calculate_bollinger_position, calculate_macd, cross_mask, either,
    macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW},
};
use crate::domain::price_table::SymbolSeries;
use crate::domain::strategy::SignalRules;

/// Buy when the price climbs back inside the lower band, sell when it falls
/// back inside the upper band, exit when it crosses its moving average.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerRules {
    pub window: usize,
}

impl Default for BollingerRules {
    fn default() -> Self {
        BollingerRules {
            window: DEFAULT_BOLLINGER_WINDOW,
        }
    }
}

impl SignalRules for BollingerRules {
    fn evaluate_buy(&self, series: &SymbolSeries) -> Vec<bool> {
        let position = calculate_bollinger_position(&series.price, self.window);
        cross_mask(&position.band, |v| v > -1.0, |p| p <= -1.0)
    }

    fn evaluate_sell(&self, series: &SymbolSeries) -> Vec<bool> {
        let position = calculate_bollinger_position(&series.price, self.window);
        cross_mask(&position.band, |v| v < 1.0, |p| p >= 1.0)
    }

    fn evaluate_exit(&self, series: &SymbolSeries) -> Vec<bool> {
        let ratio = calculate_bollinger_position(&series.price, self.window).sma_ratio;
        either(
            &cross_mask(&ratio, |v| v >= 0.0, |p| p < 0.0),
            &cross_mask(&ratio, |v| v <= 0.0, |p| p > 0.0),
        )
    }
}

/// Bollinger entries; exits on the moving-average cross or when the MACD
/// histogram changes sign.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdBollingerRules {
    pub bollinger: BollingerRules,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdBollingerRules {
    fn default() -> Self {
        MacdBollingerRules {
            bollinger: BollingerRules::default(),
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl SignalRules for MacdBollingerRules {
    fn evaluate_buy(&self, series: &SymbolSeries) -> Vec<bool> {
        self.bollinger.evaluate_buy(series)
    }

    fn evaluate_sell(&self, series: &SymbolSeries) -> Vec<bool> {
        self.bollinger.evaluate_sell(series)
    }

    fn evaluate_exit(&self, series: &SymbolSeries) -> Vec<bool> {
        let hist = calculate_macd(&series.price, self.fast, self.slow, self.signal).histogram;
        let turned_down = cross_mask(&hist, |v| v <= 0.0, |p| p > 0.0);
        let turned_up = cross_mask(&hist, |v| v >= 0.0, |p| p < 0.0);
        either(
            &self.bollinger.evaluate_exit(series),
            &either(&turned_down, &turned_up),
        )
    }
}
