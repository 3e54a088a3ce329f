//! Orders and trade direction.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn opposite(self) -> Self {
        match self {
            Action::Buy => Action::Sell,
            Action::Sell => Action::Buy,
        }
    }

    /// +1 for BUY, -1 for SELL.
    pub fn sign(self) -> i64 {
        match self {
            Action::Buy => 1,
            Action::Sell => -1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            other => Err(format!("unknown order action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: Action,
    pub shares: i64,
}

impl Order {
    pub fn new(date: NaiveDate, symbol: &str, action: Action, shares: i64) -> Self {
        Order {
            date,
            symbol: symbol.to_string(),
            action,
            shares,
        }
    }

    /// Signed share delta: the action carries direction, the share count only magnitude.
    pub fn signed_shares(&self) -> i64 {
        self.action.sign() * self.shares.abs()
    }

    /// Copy of the order with its share count reduced to a pure magnitude.
    pub fn canonical(&self) -> Self {
        Order {
            shares: self.shares.abs(),
            ..self.clone()
        }
    }
}

/// Merge per-symbol streams into one stream ordered by date.
///
/// The sort is stable, so orders sharing a date keep the order in which
/// their symbols were supplied.
pub fn concat_orders<I>(streams: I) -> Vec<Order>
where
    I: IntoIterator<Item = Vec<Order>>,
{
    let mut all: Vec<Order> = streams.into_iter().flatten().collect();
    all.sort_by_key(|o| o.date);
    all
}
