//! Performance analysis of a daily portfolio value series.

use crate::domain::allocation::AllocationPortfolio;
use crate::domain::simulation::SimulatedPortfolio;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;

/// Fewest overlapping returns accepted when the two series differ in length.
const MIN_BETA_RETURNS: usize = 3;

/// Anything that yields one account value per trading day, along with the
/// benchmark price on those days.
pub trait DailyValues {
    fn daily_values(&self) -> Vec<f64>;

    fn benchmark_values(&self) -> Vec<f64>;
}

impl DailyValues for SimulatedPortfolio {
    fn daily_values(&self) -> Vec<f64> {
        self.totals()
    }

    fn benchmark_values(&self) -> Vec<f64> {
        let prices = self.prices();
        self.values()
            .iter()
            .filter_map(|v| prices.row(v.date).map(|i| prices.benchmark()[i]))
            .collect()
    }
}

impl DailyValues for AllocationPortfolio {
    fn daily_values(&self) -> Vec<f64> {
        self.values().to_vec()
    }

    fn benchmark_values(&self) -> Vec<f64> {
        self.benchmark().to_vec()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPerformance {
    /// Value relative to the first day, minus one, per day.
    pub cumulative_returns: Vec<f64>,
    pub cumulative_return: f64,
    pub avg_daily_return: f64,
    /// Sample standard deviation of daily returns.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    /// Sensitivity of daily returns to the benchmark's; 1.0 when it cannot
    /// be estimated.
    pub beta: f64,
}

impl PortfolioPerformance {
    /// `None` when there is no value or the first value is zero.
    pub fn compute(values: &[f64], benchmark: &[f64], interest_rate: f64) -> Option<Self> {
        let first = *values.first()?;
        let last = *values.last()?;
        if first == 0.0 {
            return None;
        }

        let cumulative_returns = values.iter().map(|v| v / first - 1.0).collect();
        let returns = daily_returns(values);
        let avg_daily_return = mean(&returns);
        let volatility = sample_stddev(&returns);

        let daily_risk_free = (1.0 + interest_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
        let excess = mean(&returns.iter().map(|r| r - daily_risk_free).collect::<Vec<_>>());
        let sharpe_ratio = if volatility > 0.0 {
            TRADING_DAYS_PER_YEAR.sqrt() * excess / volatility
        } else {
            0.0
        };

        Some(PortfolioPerformance {
            cumulative_returns,
            cumulative_return: last / first - 1.0,
            avg_daily_return,
            volatility,
            sharpe_ratio,
            max_drawdown: max_drawdown(values),
            beta: estimate_beta(&returns, &daily_returns(benchmark)),
        })
    }

    pub fn assess<P: DailyValues + ?Sized>(portfolio: &P, interest_rate: f64) -> Option<Self> {
        Self::compute(&portfolio.daily_values(), &portfolio.benchmark_values(), interest_rate)
    }
}

fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Sample covariance with the benchmark over the benchmark's sample variance.
///
/// Series of unequal length are aligned on their most recent returns.
fn estimate_beta(returns: &[f64], benchmark: &[f64]) -> f64 {
    let n = returns.len().min(benchmark.len());
    if returns.len() != benchmark.len() && n < MIN_BETA_RETURNS {
        return 1.0;
    }
    if n < 2 {
        return 1.0;
    }
    let algo = &returns[returns.len() - n..];
    let bench = &benchmark[benchmark.len() - n..];

    let (ma, mb) = (mean(algo), mean(bench));
    let covariance = algo.iter().zip(bench).map(|(a, b)| (a - ma) * (b - mb)).sum::<f64>() / (n - 1) as f64;
    let variance = bench.iter().map(|b| (b - mb).powi(2)).sum::<f64>() / (n - 1) as f64;
    if variance > 0.0 { covariance / variance } else { 1.0 }
}

/// Largest peak-to-trough fall as a fraction of the peak.
fn max_drawdown(values: &[f64]) -> f64 {
    let Some(&start) = values.first() else {
        return 0.0;
    };
    let mut peak = start;
    let mut max_dd = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - v) / peak);
        }
    }
    max_dd
}
