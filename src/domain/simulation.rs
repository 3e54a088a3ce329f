//! Holdings, cash and leverage simulation over an order stream.
//!
//! The simulation walks the dense trade calendar, keeping running share
//! counts and running traded notional. A day is emitted only when every
//! traded symbol has a price, which truncates the series to the trading
//! calendar covered by the price table.

use crate::domain::error::LevtraderError;
use crate::domain::order::Order;
use crate::domain::price_table::PriceTable;
use crate::domain::trade_matrix::TradeMatrix;
use chrono::NaiveDate;
use log::warn;
use std::sync::Arc;

/// Totals closer to zero than this leave leverage undefined.
pub const LEVERAGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyValue {
    pub date: NaiveDate,
    /// Cumulative shares per symbol, in the portfolio's symbol order.
    pub holdings: Vec<i64>,
    /// Market value per symbol, in the portfolio's symbol order.
    pub positions: Vec<f64>,
    pub cash: f64,
    pub total: f64,
    /// Gross exposure over total value; `None` when total is ~0.
    pub leverage: Option<f64>,
}

impl DailyValue {
    pub fn gross_exposure(&self) -> f64 {
        self.positions.iter().map(|v| v.abs()).sum()
    }

    pub fn net_exposure(&self) -> f64 {
        self.positions.iter().sum()
    }
}

/// Immutable result of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulatedPortfolio {
    orders: Vec<Order>,
    start_value: f64,
    end_date: NaiveDate,
    symbols: Vec<String>,
    values: Vec<DailyValue>,
    prices: Arc<PriceTable>,
}

/// Run the holdings/leverage simulation.
///
/// `end_date` defaults to the last order date. Fails with
/// [`LevtraderError::NoOverlappingData`] when no calendar day has a price for
/// every traded symbol.
pub fn simulate(
    orders: Vec<Order>,
    start_value: f64,
    end_date: Option<NaiveDate>,
    prices: Arc<PriceTable>,
) -> Result<SimulatedPortfolio, LevtraderError> {
    let matrix = TradeMatrix::aggregate(&orders, end_date)?;
    let symbols = matrix.symbols.clone();

    let mut held = vec![0i64; symbols.len()];
    let mut spent = 0.0_f64;
    let mut unpriced_trades = 0usize;
    let mut values = Vec::new();

    for (date, deltas) in matrix.dates.iter().zip(&matrix.deltas) {
        let day_prices: Vec<Option<f64>> = symbols.iter().map(|s| prices.price(s, *date)).collect();

        for (col, &delta) in deltas.iter().enumerate() {
            held[col] += delta;
            match day_prices[col] {
                Some(price) => spent += delta as f64 * price,
                None if delta != 0 => unpriced_trades += 1,
                None => {}
            }
        }

        let cash = start_value - spent;
        let Some(day_prices) = day_prices.into_iter().collect::<Option<Vec<f64>>>() else {
            continue;
        };

        let positions: Vec<f64> = held
            .iter()
            .zip(&day_prices)
            .map(|(&shares, &price)| shares as f64 * price)
            .collect();
        let total = cash + positions.iter().sum::<f64>();
        let gross: f64 = positions.iter().map(|v| v.abs()).sum();
        let leverage = if total.abs() < LEVERAGE_EPSILON {
            None
        } else {
            Some(gross / total)
        };

        values.push(DailyValue {
            date: *date,
            holdings: held.clone(),
            positions,
            cash,
            total,
            leverage,
        });
    }

    if unpriced_trades > 0 {
        warn!(
            "{} trades fell on dates without a price; their notional was not charged to cash",
            unpriced_trades
        );
    }

    if values.is_empty() {
        return Err(LevtraderError::NoOverlappingData {
            symbols: symbols.join(","),
            start: matrix.start_date(),
            end: matrix.end_date(),
        });
    }

    Ok(SimulatedPortfolio {
        orders,
        start_value,
        end_date: matrix.end_date(),
        symbols,
        values,
        prices,
    })
}

impl SimulatedPortfolio {
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn values(&self) -> &[DailyValue] {
        &self.values
    }

    pub fn prices(&self) -> &Arc<PriceTable> {
        &self.prices
    }

    pub fn totals(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.total).collect()
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<&DailyValue> {
        self.values
            .binary_search_by_key(&date, |v| v.date)
            .ok()
            .map(|i| &self.values[i])
    }

    pub fn leverage_on(&self, date: NaiveDate) -> Option<f64> {
        self.value_on(date).and_then(|v| v.leverage)
    }

    /// Peak defined leverage over the series.
    pub fn max_leverage(&self) -> Option<f64> {
        self.values
            .iter()
            .filter_map(|v| v.leverage)
            .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.max(l))))
    }

    pub fn is_over_leveraged(&self, max_leverage: f64) -> bool {
        self.first_breach(max_leverage).is_some()
    }

    /// Earliest date whose leverage exceeds `max_leverage`.
    pub fn first_breach(&self, max_leverage: f64) -> Option<NaiveDate> {
        self.values
            .iter()
            .find(|v| v.leverage.is_some_and(|l| l > max_leverage))
            .map(|v| v.date)
    }
}
