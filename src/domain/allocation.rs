//! Fixed-weight portfolio: each symbol holds a constant share of the
//! starting value, marked to its price relative to the first day.

use crate::domain::error::LevtraderError;
use crate::domain::price_table::{PriceTable, fill_forward_backward};
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPortfolio {
    symbols: Vec<String>,
    allocations: Vec<f64>,
    start_value: f64,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    benchmark: Vec<f64>,
}

impl AllocationPortfolio {
    /// Validate the request against the source, then price it.
    pub fn load(
        source: &dyn PriceSource,
        symbols: &[String],
        allocations: &[f64],
        start: NaiveDate,
        end: NaiveDate,
        start_value: f64,
    ) -> Result<Self, LevtraderError> {
        if let Some(unknown) = symbols.iter().find(|s| !source.can_use(s)) {
            return Err(LevtraderError::UnknownSymbol {
                symbol: unknown.clone(),
            });
        }
        check_lengths(symbols, allocations)?;
        let table = source.get_data(symbols, start, end, false)?;
        Self::from_table(symbols, allocations, start_value, &table)
    }

    pub fn from_table(
        symbols: &[String],
        allocations: &[f64],
        start_value: f64,
        table: &PriceTable,
    ) -> Result<Self, LevtraderError> {
        check_lengths(symbols, allocations)?;

        let mut values = vec![0.0; table.len()];
        for (symbol, weight) in symbols.iter().zip(allocations) {
            let column = table.column(symbol).ok_or_else(|| LevtraderError::UnknownSymbol {
                symbol: symbol.clone(),
            })?;
            let prices: Vec<f64> = fill_forward_backward(&column.price).into_iter().flatten().collect();
            let first = match prices.first() {
                Some(p) if prices.len() == table.len() && *p != 0.0 => *p,
                _ => {
                    return Err(LevtraderError::PriceData {
                        reason: format!("no usable prices for {}", symbol),
                    });
                }
            };
            for (total, price) in values.iter_mut().zip(&prices) {
                *total += price / first * weight * start_value;
            }
        }

        Ok(AllocationPortfolio {
            symbols: symbols.to_vec(),
            allocations: allocations.to_vec(),
            start_value,
            dates: table.dates().to_vec(),
            values,
            benchmark: table.benchmark().to_vec(),
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn allocations(&self) -> &[f64] {
        &self.allocations
    }

    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Benchmark price on each portfolio date.
    pub fn benchmark(&self) -> &[f64] {
        &self.benchmark
    }
}

fn check_lengths(symbols: &[String], allocations: &[f64]) -> Result<(), LevtraderError> {
    if symbols.len() != allocations.len() {
        return Err(LevtraderError::AllocationMismatch {
            symbols: symbols.len(),
            allocations: allocations.len(),
        });
    }
    Ok(())
}
