//! Instruction rows and the label-cleaning stages of the strategy pipeline.
//!
//! Every stage takes rows by value and returns new rows. Rows carry the
//! symbol's price, high and low so that overlays can work on them without
//! going back to the price table.

use crate::domain::error::LevtraderError;
use crate::domain::order::{Action, Order};
use crate::domain::price_table::SymbolSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
    Exit,
}

impl Signal {
    /// Tradeable direction; `None` for an unresolved exit.
    pub fn action(self) -> Option<Action> {
        match self {
            Signal::Buy => Some(Action::Buy),
            Signal::Sell => Some(Action::Sell),
            Signal::Exit => None,
        }
    }
}

impl From<Action> for Signal {
    fn from(action: Action) -> Self {
        match action {
            Action::Buy => Signal::Buy,
            Action::Sell => Signal::Sell,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Exit => write!(f, "EXIT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionRow {
    pub date: NaiveDate,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub signal: Option<Signal>,
    pub shares: i64,
    /// Set when the row closes the previous position rather than opening one.
    pub closing: bool,
    pub stop_low: Option<f64>,
    pub stop_high: Option<f64>,
}

impl InstructionRow {
    pub fn new(date: NaiveDate, price: f64, high: f64, low: f64, shares: i64) -> Self {
        InstructionRow {
            date,
            price,
            high,
            low,
            signal: None,
            shares,
            closing: false,
            stop_low: None,
            stop_high: None,
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// One unlabelled row per date of the series.
pub fn rows_from_series(series: &SymbolSeries, shares: i64) -> Vec<InstructionRow> {
    (0..series.len())
        .map(|i| {
            InstructionRow::new(
                series.dates[i],
                series.price[i],
                series.high[i],
                series.low[i],
                shares,
            )
        })
        .collect()
}

fn check_mask(name: &str, mask: &[bool], len: usize) -> Result<(), LevtraderError> {
    if mask.len() != len {
        return Err(LevtraderError::StrategyInvalid {
            reason: format!("{} mask has {} entries for {} rows", name, mask.len(), len),
        });
    }
    Ok(())
}

/// Label BUY then SELL; a date firing both ends up SELL.
pub fn label_entries(
    mut rows: Vec<InstructionRow>,
    buy: &[bool],
    sell: &[bool],
) -> Result<Vec<InstructionRow>, LevtraderError> {
    check_mask("buy", buy, rows.len())?;
    check_mask("sell", sell, rows.len())?;
    for (row, _) in rows.iter_mut().zip(buy).filter(|(_, b)| **b) {
        row.signal = Some(Signal::Buy);
    }
    for (row, _) in rows.iter_mut().zip(sell).filter(|(_, s)| **s) {
        row.signal = Some(Signal::Sell);
    }
    Ok(rows)
}

/// Mark exit dates EXIT, overriding any entry label.
pub fn label_exits(mut rows: Vec<InstructionRow>, exit: &[bool]) -> Result<Vec<InstructionRow>, LevtraderError> {
    check_mask("exit", exit, rows.len())?;
    for (row, _) in rows.iter_mut().zip(exit).filter(|(_, e)| **e) {
        row.signal = Some(Signal::Exit);
    }
    Ok(rows)
}

/// Drop unlabelled rows, then every row repeating the previous kept label.
pub fn remove_duplicates(rows: Vec<InstructionRow>) -> Vec<InstructionRow> {
    let mut kept: Vec<InstructionRow> = Vec::new();
    for row in rows.into_iter().filter(|r| r.signal.is_some()) {
        if kept.last().is_some_and(|prev| prev.signal == row.signal) {
            continue;
        }
        kept.push(row);
    }
    kept
}

/// Turn each EXIT into the opposite of the row before it and drop leading EXITs.
pub fn resolve_exits(rows: Vec<InstructionRow>) -> Vec<InstructionRow> {
    let mut out: Vec<InstructionRow> = Vec::with_capacity(rows.len());
    for mut row in rows {
        match row.signal {
            Some(Signal::Exit) => {
                let Some(prev) = out.last().and_then(|r| r.signal).and_then(Signal::action) else {
                    continue;
                };
                row.signal = Some(prev.opposite().into());
                row.closing = true;
                out.push(row);
            }
            Some(_) => out.push(row),
            None => {}
        }
    }
    out
}

/// Emit the tradeable rows as orders.
pub fn to_orders(symbol: &str, rows: &[InstructionRow]) -> Vec<Order> {
    rows.iter()
        .filter_map(|r| {
            let action = r.signal.and_then(Signal::action)?;
            Some(Order::new(r.date, symbol, action, r.shares.abs()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn rows(signals: &[Option<Signal>]) -> Vec<InstructionRow> {
        signals
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut row = InstructionRow::new(date(i as u32 + 1), 10.0, 11.0, 9.0, 100);
                row.signal = *s;
                row
            })
            .collect()
    }

    fn labels(rows: &[InstructionRow]) -> Vec<Option<Signal>> {
        rows.iter().map(|r| r.signal).collect()
    }

    use Signal::{Buy, Exit, Sell};

    #[test]
    fn sell_overrides_buy_on_same_date() {
        let out = label_entries(rows(&[None, None]), &[true, true], &[false, true]).unwrap();
        assert_eq!(labels(&out), vec![Some(Buy), Some(Sell)]);
    }

    #[test]
    fn exit_overrides_entries() {
        let out = label_exits(rows(&[Some(Buy), Some(Sell)]), &[false, true]).unwrap();
        assert_eq!(labels(&out), vec![Some(Buy), Some(Exit)]);
    }

    #[test]
    fn mask_length_mismatch_is_rejected() {
        let err = label_entries(rows(&[None, None]), &[true], &[false, false]).unwrap_err();
        assert!(matches!(err, LevtraderError::StrategyInvalid { .. }));
    }

    #[test]
    fn duplicates_collapse_across_gaps() {
        let out = remove_duplicates(rows(&[
            Some(Buy),
            None,
            Some(Buy),
            Some(Exit),
            Some(Exit),
            Some(Sell),
        ]));
        assert_eq!(labels(&out), vec![Some(Buy), Some(Exit), Some(Sell)]);
        assert_eq!(out[1].date, date(4));
    }

    #[test]
    fn exits_resolve_against_previous_row() {
        let out = resolve_exits(rows(&[Some(Exit), Some(Buy), Some(Exit), Some(Sell), Some(Exit)]));
        assert_eq!(labels(&out), vec![Some(Buy), Some(Sell), Some(Sell), Some(Buy)]);
        assert!(out[1].closing);
        assert!(!out[2].closing);
    }

    #[test]
    fn close_and_same_side_entry_keep_their_dates() {
        let out = resolve_exits(rows(&[Some(Buy), Some(Exit), Some(Sell), Some(Exit)]));
        assert_eq!(labels(&out), vec![Some(Buy), Some(Sell), Some(Sell), Some(Buy)]);
        let dates: Vec<NaiveDate> = out.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3), date(4)]);
        assert!(out.iter().all(|r| r.shares == 100));
        assert!(out[1].closing && !out[2].closing && out[3].closing);
    }

    #[test]
    fn to_orders_skips_unresolved_rows() {
        let orders = to_orders("IBM", &rows(&[Some(Buy), Some(Exit), None, Some(Sell)]));
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].action, Action::Buy);
        assert_eq!(orders[1].action, Action::Sell);
        assert_eq!(orders[1].symbol, "IBM");
    }
}
