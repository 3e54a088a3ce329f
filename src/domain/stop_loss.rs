//! Stop-loss bracket sized by the average daily range (ADR).
//!
//! ADR is the rolling mean of High - Low. An entry sets a band around the
//! day's range; the band holds until the next entry, and any price at or
//! beyond it forces an EXIT.

use crate::domain::indicator::rolling_mean;
use crate::domain::price_table::SymbolSeries;
use crate::domain::signal::{InstructionRow, Signal, rows_from_series};
use chrono::NaiveDate;

pub const DEFAULT_LOW_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_HIGH_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_ADR_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct AdrStopLoss {
    pub low: f64,
    pub high: f64,
    pub window: usize,
}

impl Default for AdrStopLoss {
    fn default() -> Self {
        AdrStopLoss {
            low: DEFAULT_LOW_MULTIPLIER,
            high: DEFAULT_HIGH_MULTIPLIER,
            window: DEFAULT_ADR_WINDOW,
        }
    }
}

/// ADR computed over one symbol's history, ready for band queries.
#[derive(Debug, Clone)]
pub struct PreparedStops {
    low: f64,
    high: f64,
    dates: Vec<NaiveDate>,
    price: Vec<f64>,
    adr: Vec<Option<f64>>,
}

impl AdrStopLoss {
    pub fn adr(&self, series: &SymbolSeries) -> Vec<Option<f64>> {
        let ranges: Vec<f64> = series
            .high
            .iter()
            .zip(&series.low)
            .map(|(h, l)| h - l)
            .collect();
        rolling_mean(&ranges, self.window)
    }

    pub fn pre_process(&self, series: &SymbolSeries) -> PreparedStops {
        PreparedStops {
            low: self.low,
            high: self.high,
            dates: series.dates.clone(),
            price: series.price.clone(),
            adr: self.adr(series),
        }
    }

    /// Band set by an entry row: `(stop_low, stop_high)`.
    fn entry_band(&self, row: &InstructionRow, adr: f64) -> Option<(f64, f64)> {
        match row.signal? {
            Signal::Buy => Some((row.low - self.low * adr, row.high + self.high * adr)),
            Signal::Sell => Some((row.low - self.high * adr, row.high + self.low * adr)),
            Signal::Exit => None,
        }
    }

    /// Overlay the bracket on deduplicated rows.
    ///
    /// Returns one row per series date: the labelled rows in place, bands
    /// carried forward from the latest entry, and EXIT wherever the price
    /// touches the band.
    pub fn process(&self, series: &SymbolSeries, rows: Vec<InstructionRow>, shares: i64) -> Vec<InstructionRow> {
        let adr = self.adr(series);
        let mut full = rows_from_series(series, shares);
        for row in rows {
            if let Some(i) = series.position(row.date) {
                full[i] = row;
            }
        }

        let mut band: Option<(f64, f64)> = None;
        for (row, adr) in full.iter_mut().zip(&adr) {
            if let Some(adr) = adr {
                if let Some(next) = self.entry_band(row, *adr) {
                    band = Some(next);
                }
            }
            if let Some((stop_low, stop_high)) = band {
                row.stop_low = Some(stop_low);
                row.stop_high = Some(stop_high);
                if row.price >= stop_high || row.price <= stop_low {
                    row.signal = Some(Signal::Exit);
                }
            }
        }
        full
    }
}

impl PreparedStops {
    /// `(low, high)` band around the day's price. Long positions put the
    /// wider multiplier above the price, short positions below it.
    pub fn get_exit(&self, date: NaiveDate, short: bool) -> Option<(f64, f64)> {
        let i = self.dates.binary_search(&date).ok()?;
        let price = self.price[i];
        let adr = self.adr[i]?;
        if short {
            Some((price - self.high * adr, price + self.low * adr))
        } else {
            Some((price - self.low * adr, price + self.high * adr))
        }
    }
}
