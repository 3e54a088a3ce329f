//! Aligned price table shared by the simulator and the strategy pipeline.
//!
//! Rows are the benchmark's trading dates inside the requested range. Each
//! symbol column holds the adjusted price plus the daily high/low, `None`
//! where the symbol did not trade on a benchmark date.

use crate::domain::error::LevtraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_INDEX_SYMBOL: &str = "SPY";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolColumn {
    pub price: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

impl SymbolColumn {
    /// Column with price only; high and low mirror the price.
    pub fn from_prices(prices: Vec<Option<f64>>) -> Self {
        SymbolColumn {
            high: prices.clone(),
            low: prices.clone(),
            price: prices,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index_symbol: String,
    dates: Vec<NaiveDate>,
    benchmark: Vec<f64>,
    columns: BTreeMap<String, SymbolColumn>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceTable {
    /// Empty-column table over the given benchmark rows.
    pub fn new(index_symbol: &str, dates: Vec<NaiveDate>, benchmark: Vec<f64>) -> Self {
        let date_index = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        PriceTable {
            index_symbol: index_symbol.to_string(),
            dates,
            benchmark,
            columns: BTreeMap::new(),
            date_index,
        }
    }

    /// Add or replace a symbol column. Columns shorter than the table are padded with `None`.
    pub fn with_symbol(mut self, symbol: &str, mut column: SymbolColumn) -> Self {
        let n = self.dates.len();
        column.price.resize(n, None);
        column.high.resize(n, None);
        column.low.resize(n, None);
        self.columns.insert(symbol.to_string(), column);
        self
    }

    /// Join per-symbol histories onto the benchmark's trading dates within `[start, end]`.
    pub fn assemble(
        index_symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        benchmark: &[OhlcvBar],
        histories: &[(String, Vec<OhlcvBar>)],
    ) -> Self {
        let mut rows: Vec<&OhlcvBar> = benchmark
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        rows.sort_by_key(|b| b.date);
        rows.dedup_by_key(|b| b.date);

        let dates: Vec<NaiveDate> = rows.iter().map(|b| b.date).collect();
        let closes: Vec<f64> = rows.iter().map(|b| b.adj_close).collect();
        let mut table = PriceTable::new(index_symbol, dates, closes);

        for (symbol, bars) in histories {
            let by_date: HashMap<NaiveDate, &OhlcvBar> = bars.iter().map(|b| (b.date, b)).collect();
            let mut column = SymbolColumn::default();
            for date in &table.dates {
                let bar = by_date.get(date);
                column.price.push(bar.map(|b| b.adj_close));
                column.high.push(bar.map(|b| b.high));
                column.low.push(bar.map(|b| b.low));
            }
            table = table.with_symbol(symbol, column);
        }

        table
    }

    pub fn index_symbol(&self) -> &str {
        &self.index_symbol
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn benchmark(&self) -> &[f64] {
        &self.benchmark
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, symbol: &str) -> Option<&SymbolColumn> {
        self.columns.get(symbol)
    }

    /// Price of `symbol` on `date`; `None` for non-trading dates, unknown symbols and gaps.
    pub fn price(&self, symbol: &str, date: NaiveDate) -> Option<f64> {
        let row = self.row(date)?;
        self.columns.get(symbol)?.price[row]
    }

    /// Gap-filled single-symbol view used by the strategy pipeline.
    ///
    /// Missing prices are forward-filled, then backward-filled for a leading
    /// gap. Missing high/low fall back to the filled price.
    pub fn symbol_series(&self, symbol: &str) -> Result<SymbolSeries, LevtraderError> {
        let column = self
            .columns
            .get(symbol)
            .ok_or_else(|| LevtraderError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;

        let filled = fill_forward_backward(&column.price);
        if filled.iter().any(Option::is_none) {
            return Err(LevtraderError::PriceData {
                reason: format!("no prices for {}", symbol),
            });
        }
        let price: Vec<f64> = filled.into_iter().flatten().collect();
        let high = column
            .high
            .iter()
            .zip(&price)
            .map(|(h, p)| h.unwrap_or(*p))
            .collect();
        let low = column
            .low
            .iter()
            .zip(&price)
            .map(|(l, p)| l.unwrap_or(*p))
            .collect();

        Ok(SymbolSeries {
            symbol: symbol.to_string(),
            dates: self.dates.clone(),
            price,
            high,
            low,
        })
    }
}

/// One symbol's gap-free price history.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub price: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
}

impl SymbolSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

/// Forward-fill gaps, then backward-fill whatever leads the series.
pub fn fill_forward_backward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut last = None;
    for v in values {
        if v.is_some() {
            last = *v;
        }
        out.push(last);
    }
    let mut next = None;
    for v in out.iter_mut().rev() {
        if v.is_some() {
            next = *v;
        } else {
            *v = next;
        }
    }
    out
}
