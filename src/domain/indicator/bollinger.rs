//! Position of the price inside its Bollinger band.
//!
//! band = (P - SMA(n)) / (2 * STD(n)) with the sample standard deviation, so
//! -1 and +1 are the lower and upper bands. sma_ratio = P / SMA(n) - 1.

use crate::domain::indicator::{rolling_mean, rolling_stddev};

pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerPosition {
    pub band: Vec<Option<f64>>,
    pub sma_ratio: Vec<Option<f64>>,
}

pub fn calculate_bollinger_position(prices: &[f64], window: usize) -> BollingerPosition {
    let sma = rolling_mean(prices, window);
    let std = rolling_stddev(prices, window);

    let band = prices
        .iter()
        .zip(sma.iter().zip(&std))
        .map(|(p, (m, s))| match (m, s) {
            (Some(m), Some(s)) if *s > 0.0 => Some((p - m) / (2.0 * s)),
            _ => None,
        })
        .collect();
    let sma_ratio = prices
        .iter()
        .zip(&sma)
        .map(|(p, m)| match m {
            Some(m) if *m != 0.0 => Some(p / m - 1.0),
            _ => None,
        })
        .collect();

    BollingerPosition { band, sma_ratio }
}
