//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for levtrader.
#[derive(Debug, thiserror::Error)]
pub enum LevtraderError {
    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("can't find orders file <{path}>")]
    OrdersFileMissing { path: String },

    #[error("invalid order row {row}: {reason}")]
    OrderParse { row: usize, reason: String },

    #[error("order stream is empty")]
    EmptyOrders,

    #[error("unknown <{symbol}> symbol")]
    UnknownSymbol { symbol: String },

    #[error("mismatched arrays: {symbols} symbols, {allocations} allocations")]
    AllocationMismatch { symbols: usize, allocations: usize },

    #[error("invalid date range: {start} to {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("no overlapping price data for {symbols} between {start} and {end}")]
    NoOverlappingData {
        symbols: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("invalid strategy: {reason}")]
    StrategyInvalid { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LevtraderError> for std::process::ExitCode {
    fn from(err: &LevtraderError) -> Self {
        let code: u8 = match err {
            LevtraderError::Io(_) => 1,
            LevtraderError::ConfigParse { .. }
            | LevtraderError::ConfigMissing { .. }
            | LevtraderError::ConfigInvalid { .. } => 2,
            LevtraderError::PriceData { .. } | LevtraderError::UnknownSymbol { .. } => 3,
            LevtraderError::OrdersFileMissing { .. }
            | LevtraderError::OrderParse { .. }
            | LevtraderError::EmptyOrders
            | LevtraderError::AllocationMismatch { .. }
            | LevtraderError::StrategyInvalid { .. } => 4,
            LevtraderError::InvalidDateRange { .. } | LevtraderError::NoOverlappingData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
