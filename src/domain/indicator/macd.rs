//! MACD: EMA(fast) - EMA(slow), its EMA(signal) and their difference.

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    /// line - signal
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = values.len();
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: vec![None; n],
            signal: vec![None; n],
            histogram: vec![None; n],
        };
    }

    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);
    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // signal EMA runs over the defined part of the line only
    let first = line.iter().position(Option::is_some).unwrap_or(n);
    let defined: Vec<f64> = line[first..].iter().flatten().copied().collect();
    let mut signal = vec![None; first];
    signal.extend(calculate_ema(&defined, signal_period));

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

pub fn calculate_macd_default(values: &[f64]) -> MacdSeries {
    calculate_macd(values, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
