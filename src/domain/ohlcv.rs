//! Daily OHLCV bar as delivered by a price source.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Split/dividend adjusted close; this is the price the simulator trades at.
    pub adj_close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// high - low
    pub fn daily_range(&self) -> f64 {
        self.high - self.low
    }
}
