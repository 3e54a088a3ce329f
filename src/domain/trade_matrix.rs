//! Trade aggregation: order stream to a dense date x symbol matrix of share deltas.
//!
//! Same-day orders for one symbol net against each other. The calendar runs
//! from the first order date to the end date inclusive, weekends and holidays
//! included, so every calendar day has a (possibly all-zero) row.

use crate::domain::error::LevtraderError;
use crate::domain::order::Order;
use chrono::NaiveDate;
use log::warn;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeMatrix {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    /// `deltas[row][col]`: net signed shares for `dates[row]`, `symbols[col]`.
    pub deltas: Vec<Vec<i64>>,
}

impl TradeMatrix {
    /// Aggregate an order stream. `end_date` defaults to the last order date.
    pub fn aggregate(orders: &[Order], end_date: Option<NaiveDate>) -> Result<Self, LevtraderError> {
        let start = orders
            .iter()
            .map(|o| o.date)
            .min()
            .ok_or(LevtraderError::EmptyOrders)?;
        let end = match end_date {
            Some(d) => d,
            None => orders.iter().map(|o| o.date).max().unwrap_or(start),
        };
        if end < start {
            return Err(LevtraderError::InvalidDateRange { start, end });
        }

        let mut symbols: Vec<String> = Vec::new();
        for order in orders {
            if !symbols.contains(&order.symbol) {
                symbols.push(order.symbol.clone());
            }
        }
        let col_of: HashMap<&str, usize> = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
        let mut deltas = vec![vec![0i64; symbols.len()]; dates.len()];

        let mut ignored = 0usize;
        for order in orders {
            if order.date > end {
                ignored += 1;
                continue;
            }
            let row = (order.date - start).num_days() as usize;
            let col = col_of[order.symbol.as_str()];
            deltas[row][col] += order.signed_shares();
        }
        if ignored > 0 {
            warn!("ignoring {} orders dated after {}", ignored, end);
        }

        Ok(TradeMatrix {
            dates,
            symbols,
            deltas,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn end_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Net delta for one cell; zero for dates or symbols outside the matrix.
    pub fn get(&self, date: NaiveDate, symbol: &str) -> i64 {
        let Some(col) = self.symbols.iter().position(|s| s == symbol) else {
            return 0;
        };
        if date < self.start_date() || date > self.end_date() {
            return 0;
        }
        let row = (date - self.start_date()).num_days() as usize;
        self.deltas[row][col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Action;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn dense_calendar_span() {
        let orders = vec![
            Order::new(date(5), "IBM", Action::Buy, 100),
            Order::new(date(9), "IBM", Action::Sell, 100),
        ];
        let m = TradeMatrix::aggregate(&orders, None).unwrap();
        assert_eq!(m.dates.len(), 5);
        assert_eq!(m.start_date(), date(5));
        assert_eq!(m.end_date(), date(9));
        assert_eq!(m.get(date(5), "IBM"), 100);
        assert_eq!(m.get(date(6), "IBM"), 0);
        assert_eq!(m.get(date(9), "IBM"), -100);
    }

    #[test]
    fn same_day_orders_net() {
        let orders = vec![
            Order::new(date(1), "IBM", Action::Buy, 300),
            Order::new(date(1), "IBM", Action::Sell, 100),
            Order::new(date(1), "MSFT", Action::Sell, 50),
        ];
        let m = TradeMatrix::aggregate(&orders, None).unwrap();
        assert_eq!(m.symbols, vec!["IBM", "MSFT"]);
        assert_eq!(m.deltas, vec![vec![200, -50]]);
    }

    #[test]
    fn explicit_end_date_extends_calendar() {
        let orders = vec![Order::new(date(1), "IBM", Action::Buy, 10)];
        let m = TradeMatrix::aggregate(&orders, Some(date(4))).unwrap();
        assert_eq!(m.dates, vec![date(1), date(2), date(3), date(4)]);
        assert_eq!(m.deltas[3], vec![0]);
    }

    #[test]
    fn orders_after_end_are_ignored() {
        let orders = vec![
            Order::new(date(1), "IBM", Action::Buy, 10),
            Order::new(date(8), "IBM", Action::Sell, 10),
        ];
        let m = TradeMatrix::aggregate(&orders, Some(date(3))).unwrap();
        assert_eq!(m.dates.len(), 3);
        assert_eq!(m.deltas.iter().map(|r| r[0]).sum::<i64>(), 10);
    }

    #[test]
    fn empty_orders_rejected() {
        assert!(matches!(
            TradeMatrix::aggregate(&[], None),
            Err(LevtraderError::EmptyOrders)
        ));
    }

    #[test]
    fn end_before_start_rejected() {
        let orders = vec![Order::new(date(5), "IBM", Action::Buy, 10)];
        assert!(matches!(
            TradeMatrix::aggregate(&orders, Some(date(2))),
            Err(LevtraderError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn unsorted_orders_use_earliest_date() {
        let orders = vec![
            Order::new(date(7), "IBM", Action::Sell, 10),
            Order::new(date(2), "IBM", Action::Buy, 10),
        ];
        let m = TradeMatrix::aggregate(&orders, None).unwrap();
        assert_eq!(m.start_date(), date(2));
        assert_eq!(m.end_date(), date(7));
    }

    #[test]
    fn get_outside_matrix_is_zero() {
        let orders = vec![Order::new(date(2), "IBM", Action::Buy, 10)];
        let m = TradeMatrix::aggregate(&orders, None).unwrap();
        assert_eq!(m.get(date(1), "IBM"), 0);
        assert_eq!(m.get(date(2), "MSFT"), 0);
    }
}
