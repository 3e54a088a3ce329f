//! Price history port.

use crate::domain::error::LevtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::{DEFAULT_INDEX_SYMBOL, PriceTable};
use chrono::NaiveDate;
use log::info;

pub trait PriceSource {
    /// Daily bars for `symbol` within `[start, end]`, sorted by date.
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>, LevtraderError>;

    fn can_use(&self, symbol: &str) -> bool;

    /// Benchmark whose trading dates become the table rows.
    fn index_symbol(&self) -> &str {
        DEFAULT_INDEX_SYMBOL
    }

    /// Aligned price table for `symbols` over the benchmark's trading dates.
    ///
    /// `single_symbol_mode` is for strategies that work on one symbol only
    /// and rejects any other symbol count.
    fn get_data(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        single_symbol_mode: bool,
    ) -> Result<PriceTable, LevtraderError> {
        if end < start {
            return Err(LevtraderError::InvalidDateRange { start, end });
        }
        if single_symbol_mode && symbols.len() != 1 {
            return Err(LevtraderError::PriceData {
                reason: format!("single-symbol mode needs exactly one symbol, got {}", symbols.len()),
            });
        }
        if let Some(unknown) = symbols.iter().find(|s| !self.can_use(s)) {
            return Err(LevtraderError::UnknownSymbol {
                symbol: unknown.clone(),
            });
        }

        let index = self.index_symbol().to_string();
        info!("requesting {} from {} to {}", index, start, end);
        let benchmark = self.fetch_history(&index, start, end)?;
        if benchmark.is_empty() {
            return Err(LevtraderError::PriceData {
                reason: format!("no {} prices between {} and {}", index, start, end),
            });
        }

        let mut histories = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let bars = if *symbol == index {
                benchmark.clone()
            } else {
                info!("requesting {} from {} to {}", symbol, start, end);
                self.fetch_history(symbol, start, end)?
            };
            histories.push((symbol.clone(), bars));
        }

        Ok(PriceTable::assemble(&index, start, end, &benchmark, &histories))
    }
}
