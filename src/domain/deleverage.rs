//! Iterative deleveraging: drop the order that opens the first leverage
//! breach and resimulate until the cap holds or no further fix exists.

use crate::domain::order::Order;
use crate::domain::simulation::{SimulatedPortfolio, simulate};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_MAX_LEVERAGE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct DeleverageConfig {
    pub max_leverage: f64,
    /// Pass budget; `None` means one pass per order in the initial stream.
    pub max_iterations: Option<usize>,
}

impl Default for DeleverageConfig {
    fn default() -> Self {
        DeleverageConfig {
            max_leverage: DEFAULT_MAX_LEVERAGE,
            max_iterations: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleverageStatus {
    /// Leverage never exceeds the cap.
    Compliant,
    /// The earliest breach falls on a date without any order.
    NoOrderAtBreach,
    /// Removing the next order left a stream that cannot be simulated.
    ResimulationFailed,
    IterationLimit,
}

impl fmt::Display for DeleverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeleverageStatus::Compliant => "compliant",
            DeleverageStatus::NoOrderAtBreach => "no order at breach",
            DeleverageStatus::ResimulationFailed => "resimulation failed",
            DeleverageStatus::IterationLimit => "iteration limit",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct DeleverageOutcome {
    pub portfolio: SimulatedPortfolio,
    pub status: DeleverageStatus,
    pub iterations: usize,
    /// Orders removed, in removal order.
    pub removed: Vec<Order>,
    /// Peak leverage of the input and of every accepted pass.
    pub peak_leverage: Vec<Option<f64>>,
}

impl DeleverageOutcome {
    pub fn converged(&self) -> bool {
        self.status == DeleverageStatus::Compliant
    }
}

/// Result of a single deleverage pass.
#[derive(Debug)]
pub enum DeleveragePass {
    Compliant,
    NoOrderAtBreach(NaiveDate),
    Reduced {
        portfolio: SimulatedPortfolio,
        removed: Order,
    },
    Failed {
        removed: Order,
        reason: String,
    },
}

/// Run one pass: find the first breach, drop the first order dated on it
/// and resimulate with the same start value and end date.
pub fn deleverage_once(portfolio: &SimulatedPortfolio, max_leverage: f64) -> DeleveragePass {
    let Some(breach) = portfolio.first_breach(max_leverage) else {
        return DeleveragePass::Compliant;
    };
    let Some(idx) = portfolio.orders().iter().position(|o| o.date == breach) else {
        return DeleveragePass::NoOrderAtBreach(breach);
    };

    let removed = portfolio.orders()[idx].canonical();
    let remaining: Vec<Order> = portfolio
        .orders()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != idx)
        .map(|(_, o)| o.canonical())
        .collect();

    match simulate(
        remaining,
        portfolio.start_value(),
        Some(portfolio.end_date()),
        Arc::clone(portfolio.prices()),
    ) {
        Ok(next) => DeleveragePass::Reduced {
            portfolio: next,
            removed,
        },
        Err(e) => DeleveragePass::Failed {
            removed,
            reason: e.to_string(),
        },
    }
}

/// Deleverage until compliant or stuck. Never fails: non-convergence is
/// reported through the outcome status and a warning.
pub fn deleverage(portfolio: SimulatedPortfolio, config: &DeleverageConfig) -> DeleverageOutcome {
    let budget = config
        .max_iterations
        .unwrap_or_else(|| portfolio.orders().len());
    let mut peak_leverage = vec![portfolio.max_leverage()];
    let mut removed = Vec::new();
    let mut current = portfolio;
    let mut iterations = 0;

    let status = loop {
        if !current.is_over_leveraged(config.max_leverage) {
            break DeleverageStatus::Compliant;
        }
        if iterations >= budget {
            warn!(
                "deleverage stopped after {} passes, peak leverage still {:.4}",
                iterations,
                current.max_leverage().unwrap_or(f64::NAN)
            );
            break DeleverageStatus::IterationLimit;
        }

        match deleverage_once(&current, config.max_leverage) {
            DeleveragePass::Compliant => break DeleverageStatus::Compliant,
            DeleveragePass::NoOrderAtBreach(date) => {
                warn!("leverage breach on {} has no order to remove", date);
                break DeleverageStatus::NoOrderAtBreach;
            }
            DeleveragePass::Failed { removed: order, reason } => {
                warn!(
                    "removing {} {} {} on {} left an unusable order stream: {}",
                    order.action, order.shares, order.symbol, order.date, reason
                );
                break DeleverageStatus::ResimulationFailed;
            }
            DeleveragePass::Reduced {
                portfolio,
                removed: order,
            } => {
                iterations += 1;
                debug!(
                    "pass {}: removed {} {} {} on {}, peak leverage {:?}",
                    iterations,
                    order.action,
                    order.shares,
                    order.symbol,
                    order.date,
                    portfolio.max_leverage()
                );
                peak_leverage.push(portfolio.max_leverage());
                removed.push(order);
                current = portfolio;
            }
        }
    };

    info!(
        "deleverage finished: {} after {} passes, {} orders removed",
        status,
        iterations,
        removed.len()
    );

    DeleverageOutcome {
        portfolio: current,
        status,
        iterations,
        removed,
        peak_leverage,
    }
}
