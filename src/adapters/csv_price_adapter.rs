//! Local CSV price source: one `<SYMBOL>.csv` file per symbol.
//!
//! Columns: Date, Open, High, Low, Close, Volume, Adj Close. Rows may come
//! in any date order. Rows without an adjusted close are skipped.

use crate::domain::error::LevtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_table::DEFAULT_INDEX_SYMBOL;
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open", deserialize_with = "csv::invalid_option")]
    open: Option<f64>,
    #[serde(rename = "High", deserialize_with = "csv::invalid_option")]
    high: Option<f64>,
    #[serde(rename = "Low", deserialize_with = "csv::invalid_option")]
    low: Option<f64>,
    #[serde(rename = "Close", deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
    #[serde(rename = "Volume", deserialize_with = "csv::invalid_option")]
    volume: Option<f64>,
    #[serde(rename = "Adj Close", deserialize_with = "csv::invalid_option")]
    adj_close: Option<f64>,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
    index_symbol: String,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            index_symbol: DEFAULT_INDEX_SYMBOL.to_string(),
        }
    }

    pub fn with_index_symbol(mut self, symbol: &str) -> Self {
        self.index_symbol = symbol.to_string();
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Symbols with a price file, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, LevtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| LevtraderError::PriceData {
            reason: format!("failed to read directory {}: {}", self.base_path.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

impl PriceSource for CsvPriceAdapter {
    fn fetch_history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OhlcvBar>, LevtraderError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| LevtraderError::PriceData {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut bars = Vec::new();
        for (i, result) in rdr.deserialize::<PriceRecord>().enumerate() {
            let record = result.map_err(|e| LevtraderError::PriceData {
                reason: format!("{} row {}: {}", path.display(), i + 1, e),
            })?;
            let date = NaiveDate::parse_from_str(record.date.trim(), "%Y-%m-%d").map_err(|e| {
                LevtraderError::PriceData {
                    reason: format!("{} row {}: invalid date '{}': {}", path.display(), i + 1, record.date, e),
                }
            })?;
            if date < start || date > end {
                continue;
            }
            let Some(adj_close) = record.adj_close.filter(|v| v.is_finite()) else {
                continue;
            };
            let close = record.close.unwrap_or(adj_close);
            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: record.open.unwrap_or(close),
                high: record.high.unwrap_or(close),
                low: record.low.unwrap_or(close),
                close,
                adj_close,
                volume: record.volume.unwrap_or(0.0) as i64,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn can_use(&self, symbol: &str) -> bool {
        self.csv_path(symbol).is_file()
    }

    fn index_symbol(&self) -> &str {
        &self.index_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "Date,Open,High,Low,Close,Volume,Adj Close\n";

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let ibm = format!(
            "{}{}{}{}",
            HEADER,
            "2024-01-17,110.0,120.0,105.0,115.0,55000,114.0\n",
            "2024-01-16,105.0,115.0,100.0,110.0,60000,109.0\n",
            "2024-01-15,100.0,110.0,90.0,105.0,50000,104.0\n",
        );
        fs::write(path.join("IBM.csv"), ibm).unwrap();
        fs::write(
            path.join("SPY.csv"),
            format!("{}2024-01-15,1,1,1,1,1,400.0\n2024-01-16,1,1,1,1,1,nan\n", HEADER),
        )
        .unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn fetch_history_sorts_and_maps_columns() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let bars = adapter.fetch_history("IBM", date(1), date(31)).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].adj_close, 104.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, date(17));
    }

    #[test]
    fn fetch_history_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let bars = adapter.fetch_history("IBM", date(16), date(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(16));
    }

    #[test]
    fn nan_rows_are_skipped() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let bars = adapter.fetch_history("SPY", date(1), date(31)).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(adapter.fetch_history("XYZ", date(1), date(31)).is_err());
        assert!(!adapter.can_use("XYZ"));
        assert!(adapter.can_use("IBM"));
    }

    #[test]
    fn list_symbols_only_counts_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["IBM", "SPY"]);
    }

    #[test]
    fn get_data_aligns_on_benchmark_dates() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let table = adapter
            .get_data(&["IBM".to_string()], date(1), date(31), false)
            .unwrap();
        assert_eq!(table.dates(), &[date(15)]);
        assert_eq!(table.price("IBM", date(15)), Some(104.0));
        assert_eq!(table.benchmark(), &[400.0]);
    }

    #[test]
    fn get_data_rejects_unknown_symbol() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let err = adapter
            .get_data(&["XYZ".to_string()], date(1), date(31), false)
            .unwrap_err();
        assert!(matches!(err, LevtraderError::UnknownSymbol { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn single_symbol_mode_needs_one_symbol() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let symbols = vec!["IBM".to_string(), "SPY".to_string()];
        assert!(adapter.get_data(&symbols, date(1), date(31), true).is_err());
        assert!(adapter.get_data(&symbols, date(1), date(31), false).is_ok());
    }
}
