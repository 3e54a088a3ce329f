#![allow(dead_code)]

use chrono::NaiveDate;
use levtrader::domain::error::LevtraderError;
pub use levtrader::domain::ohlcv::OhlcvBar;
use levtrader::ports::price_port::PriceSource;
use std::collections::HashMap;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_prices(self, symbol: &str, start: NaiveDate, prices: &[f64]) -> Self {
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, p)| make_bar(symbol, start + chrono::Days::new(i as u64), *p))
            .collect();
        self.with_bars(symbol, bars)
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>, LevtraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(LevtraderError::PriceData {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn can_use(&self, symbol: &str) -> bool {
        self.data.contains_key(symbol) || self.errors.contains_key(symbol)
    }
}

pub fn make_bar(symbol: &str, date: NaiveDate, price: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date,
        open: price,
        high: price + 1.0,
        low: price - 1.0,
        close: price,
        adj_close: price,
        volume: 1000,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive calendar days starting at `start`.
pub fn days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
}

/// Benchmark plus flat-priced symbols over `n` consecutive days.
pub fn flat_source(start: NaiveDate, n: usize, symbols: &[(&str, f64)]) -> MockPriceSource {
    let mut source = MockPriceSource::new().with_prices("SPY", start, &vec![400.0; n]);
    for (symbol, price) in symbols {
        source = source.with_prices(symbol, start, &vec![*price; n]);
    }
    source
}
