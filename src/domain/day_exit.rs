//! Fixed holding-period exit with stop-loss short-circuit.
//!
//! A position opened on an entry row is closed `days` trading rows later,
//! or on the first row whose price leaves the stop band set at entry.
//! Repeating the held direction extends the holding period. The opposite
//! direction reverses the position with a doubled order.

use crate::domain::order::Action;
use crate::domain::price_table::SymbolSeries;
use crate::domain::signal::{InstructionRow, Signal};
use crate::domain::stop_loss::{AdrStopLoss, PreparedStops};

#[derive(Debug, Clone, PartialEq)]
pub struct DayExit {
    pub days: usize,
    pub stop_loss: AdrStopLoss,
}

impl DayExit {
    pub fn new(days: usize, stop_loss: AdrStopLoss) -> Self {
        DayExit { days, stop_loss }
    }

    /// Run the state machine over labelled rows, one row per series date.
    /// Returns only the rows that carry an order.
    pub fn process(&self, series: &SymbolSeries, rows: Vec<InstructionRow>) -> Vec<InstructionRow> {
        let stops = self.stop_loss.pre_process(series);
        self.process_with(&stops, rows)
    }

    pub fn process_with(&self, stops: &PreparedStops, mut rows: Vec<InstructionRow>) -> Vec<InstructionRow> {
        let n = rows.len();
        let entries: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches!(r.signal, Some(Signal::Buy) | Some(Signal::Sell)))
            .map(|(i, _)| i)
            .collect();

        let mut held: Option<Action> = None;
        let mut pending: Option<usize> = None;
        let mut band: Option<(f64, f64)> = None;

        for loc in entries {
            let Some(current) = rows[loc].signal.and_then(Signal::action) else {
                continue;
            };
            let candidate = (loc + self.days < n).then_some(loc + self.days);

            if let Some(exit) = pending.filter(|p| *p < loc) {
                stamp_exit(&mut rows[exit], held);
                held = None;
            }

            let new_order = match held {
                Some(h) if h == current => {
                    rows[loc].signal = None;
                    false
                }
                Some(_) => {
                    rows[loc].shares *= 2;
                    true
                }
                None => true,
            };
            pending = candidate;
            held = Some(current);

            if new_order {
                band = stops.get_exit(rows[loc].date, current == Action::Sell);
                rows[loc].stop_low = band.map(|b| b.0);
                rows[loc].stop_high = band.map(|b| b.1);
            }

            if let Some((low, high)) = band {
                let horizon = candidate.unwrap_or(n - 1);
                if let Some(breach) = (loc + 1..=horizon)
                    .find(|&i| rows[i].price >= high || rows[i].price <= low)
                {
                    pending = Some(breach);
                }
            }
        }

        if let Some(exit) = pending {
            stamp_exit(&mut rows[exit], held);
        }

        rows.into_iter().filter(|r| r.signal.is_some()).collect()
    }
}

fn stamp_exit(row: &mut InstructionRow, held: Option<Action>) {
    let Some(held) = held else {
        return;
    };
    row.signal = Some(held.opposite().into());
    row.closing = true;
}
