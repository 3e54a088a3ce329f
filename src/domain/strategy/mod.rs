//! Strategy signal pipeline: per-symbol rules to a clean order stream.
//!
//! For each symbol the rules label entry dates, an exit policy overlays
//! exits, and the cleaning stages in [`crate::domain::signal`] collapse the
//! labels into orders. Two orders on the same side in a row only occur as a
//! close followed by a fresh entry.

pub mod bollinger;
pub mod threshold;

pub use bollinger::{BollingerRules, MacdBollingerRules};
pub use threshold::ThresholdRules;

use crate::domain::day_exit::DayExit;
use crate::domain::error::LevtraderError;
use crate::domain::order::Order;
use crate::domain::price_table::{PriceTable, SymbolSeries};
use crate::domain::signal::{
    InstructionRow, label_entries, label_exits, remove_duplicates, resolve_exits,
    rows_from_series, to_orders,
};
use crate::domain::stop_loss::AdrStopLoss;
use log::{debug, info};
use std::collections::BTreeMap;

pub const DEFAULT_SHARES: i64 = 100;

/// Signal capability of a strategy variant. Every mask is aligned with the
/// series dates.
pub trait SignalRules {
    fn evaluate_buy(&self, series: &SymbolSeries) -> Vec<bool>;

    fn evaluate_sell(&self, series: &SymbolSeries) -> Vec<bool>;

    fn evaluate_exit(&self, series: &SymbolSeries) -> Vec<bool> {
        vec![false; series.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyKind {
    Bollinger(BollingerRules),
    MacdBollinger(MacdBollingerRules),
    Threshold(ThresholdRules),
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Bollinger(_) => "bollinger",
            StrategyKind::MacdBollinger(_) => "macd_bollinger",
            StrategyKind::Threshold(_) => "threshold",
        }
    }

    fn rules(&self) -> &dyn SignalRules {
        match self {
            StrategyKind::Bollinger(r) => r,
            StrategyKind::MacdBollinger(r) => r,
            StrategyKind::Threshold(r) => r,
        }
    }
}

impl SignalRules for StrategyKind {
    fn evaluate_buy(&self, series: &SymbolSeries) -> Vec<bool> {
        self.rules().evaluate_buy(series)
    }

    fn evaluate_sell(&self, series: &SymbolSeries) -> Vec<bool> {
        self.rules().evaluate_sell(series)
    }

    fn evaluate_exit(&self, series: &SymbolSeries) -> Vec<bool> {
        self.rules().evaluate_exit(series)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitPolicy {
    /// Exits come from the rules, optionally bracketed by a stop loss.
    Signals { stop_loss: Option<AdrStopLoss> },
    /// Fixed holding period; the rules' exit mask is not used.
    HoldingPeriod(DayExit),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub exit: ExitPolicy,
    pub shares: i64,
}

impl Strategy {
    pub fn new(kind: StrategyKind, exit: ExitPolicy) -> Self {
        Strategy {
            kind,
            exit,
            shares: DEFAULT_SHARES,
        }
    }

    pub fn with_shares(mut self, shares: i64) -> Self {
        self.shares = shares;
        self
    }

    pub fn validate(&self, symbols: &[String]) -> Result<(), LevtraderError> {
        let invalid = |reason: &str| {
            Err(LevtraderError::StrategyInvalid {
                reason: reason.to_string(),
            })
        };
        if self.shares <= 0 {
            return invalid("shares per order must be positive");
        }
        if symbols.is_empty() {
            return invalid("no symbols to process");
        }
        match &self.kind {
            StrategyKind::Bollinger(r) if r.window < 2 => return invalid("bollinger window must be at least 2"),
            StrategyKind::MacdBollinger(r) if r.bollinger.window < 2 => {
                return invalid("bollinger window must be at least 2");
            }
            StrategyKind::MacdBollinger(r) if r.fast == 0 || r.slow == 0 || r.signal == 0 => {
                return invalid("MACD periods must be positive");
            }
            StrategyKind::Threshold(_) if symbols.len() != 1 => {
                return invalid("threshold strategy works on exactly one symbol");
            }
            _ => {}
        }
        if let ExitPolicy::HoldingPeriod(day_exit) = &self.exit {
            if day_exit.days == 0 {
                return invalid("holding period must be at least one day");
            }
        }
        Ok(())
    }

    /// Cleaned instruction rows for one symbol, every row carrying BUY or SELL.
    pub fn process_rows(&self, series: &SymbolSeries) -> Result<Vec<InstructionRow>, LevtraderError> {
        let rows = rows_from_series(series, self.shares);
        let rows = label_entries(
            rows,
            &self.kind.evaluate_buy(series),
            &self.kind.evaluate_sell(series),
        )?;

        let rows = match &self.exit {
            ExitPolicy::Signals { stop_loss } => {
                let rows = remove_duplicates(label_exits(rows, &self.kind.evaluate_exit(series))?);
                match stop_loss {
                    Some(stop_loss) => remove_duplicates(stop_loss.process(series, rows, self.shares)),
                    None => rows,
                }
            }
            ExitPolicy::HoldingPeriod(day_exit) => day_exit.process(series, rows),
        };

        Ok(resolve_exits(rows))
    }

    pub fn process_symbol(&self, series: &SymbolSeries) -> Result<Vec<Order>, LevtraderError> {
        let rows = self.process_rows(series)?;
        let orders = to_orders(&series.symbol, &rows);
        debug!("{}: {} orders from {} rows", series.symbol, orders.len(), series.len());
        Ok(orders)
    }

    /// Run every symbol independently against the shared price table.
    pub fn process_strategy(
        &self,
        symbols: &[String],
        prices: &PriceTable,
    ) -> Result<BTreeMap<String, Vec<Order>>, LevtraderError> {
        self.validate(symbols)?;
        let mut out = BTreeMap::new();
        for symbol in symbols {
            let series = prices.symbol_series(symbol)?;
            out.insert(symbol.clone(), self.process_symbol(&series)?);
        }
        info!(
            "{} strategy produced {} orders across {} symbols",
            self.kind.name(),
            out.values().map(Vec::len).sum::<usize>(),
            out.len()
        );
        Ok(out)
    }
}
