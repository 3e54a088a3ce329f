//! Order files: CSV with Date, Symbol, Order, Shares columns.

use crate::domain::error::LevtraderError;
use crate::domain::order::{Action, Order};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize, Serialize)]
struct OrderRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Order")]
    order: String,
    #[serde(rename = "Shares")]
    shares: i64,
}

/// Read an order file in file order. Share counts are stored as magnitudes.
pub fn load_orders<P: AsRef<Path>>(path: P) -> Result<Vec<Order>, LevtraderError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LevtraderError::OrdersFileMissing {
            path: path.display().to_string(),
        });
    }

    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path).map_err(|e| {
        LevtraderError::OrderParse {
            row: 0,
            reason: e.to_string(),
        }
    })?;

    let mut orders = Vec::new();
    for (i, result) in rdr.deserialize::<OrderRecord>().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| LevtraderError::OrderParse {
            row,
            reason: e.to_string(),
        })?;
        let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT).map_err(|e| LevtraderError::OrderParse {
            row,
            reason: format!("invalid date '{}': {}", record.date, e),
        })?;
        let action: Action = record
            .order
            .parse()
            .map_err(|reason| LevtraderError::OrderParse { row, reason })?;
        if record.symbol.is_empty() {
            return Err(LevtraderError::OrderParse {
                row,
                reason: "empty symbol".into(),
            });
        }
        orders.push(Order::new(date, &record.symbol, action, record.shares.abs()));
    }
    Ok(orders)
}

pub fn write_orders<P: AsRef<Path>>(path: P, orders: &[Order]) -> Result<(), LevtraderError> {
    let mut wtr = csv::Writer::from_path(path.as_ref()).map_err(|e| std::io::Error::other(e.to_string()))?;
    for order in orders {
        wtr.serialize(OrderRecord {
            date: order.date.format(DATE_FORMAT).to_string(),
            symbol: order.symbol.clone(),
            order: order.action.to_string(),
            shares: order.shares.abs(),
        })
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
