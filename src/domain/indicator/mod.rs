//! Indicator series over one symbol's price history.
//!
//! Every series is aligned index-for-index with its input. Warm-up entries,
//! and entries whose inputs are undefined, are `None`.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod stddev;

pub use bollinger::{BollingerPosition, DEFAULT_BOLLINGER_WINDOW, calculate_bollinger_position};
pub use ema::calculate_ema;
pub use macd::{MacdSeries, calculate_macd, calculate_macd_default};
pub use stddev::{rolling_mean, rolling_stddev};

/// Dates where `now` holds for the value and `before` held for the previous
/// value. Undefined values never fire.
pub fn cross_mask<N, B>(values: &[Option<f64>], now: N, before: B) -> Vec<bool>
where
    N: Fn(f64) -> bool,
    B: Fn(f64) -> bool,
{
    let mut mask = vec![false; values.len()];
    for i in 1..values.len() {
        if let (Some(prev), Some(cur)) = (values[i - 1], values[i]) {
            mask[i] = now(cur) && before(prev);
        }
    }
    mask
}

/// Element-wise OR of two equally long masks.
pub fn either(a: &[bool], b: &[bool]) -> Vec<bool> {
    a.iter().zip(b).map(|(x, y)| *x || *y).collect()
}
