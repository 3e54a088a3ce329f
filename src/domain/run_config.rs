//! Typed run settings built from a validated [`ConfigPort`].

use crate::domain::config_validation::{
    optional_date, parse_date, validate_data_config, validate_simulation_config,
    validate_strategy_config,
};
use crate::domain::day_exit::DayExit;
use crate::domain::deleverage::{DEFAULT_MAX_LEVERAGE, DeleverageConfig};
use crate::domain::error::LevtraderError;
use crate::domain::metrics::DEFAULT_RISK_FREE_RATE;
use crate::domain::price_table::DEFAULT_INDEX_SYMBOL;
use crate::domain::stop_loss::{
    AdrStopLoss, DEFAULT_ADR_WINDOW, DEFAULT_HIGH_MULTIPLIER, DEFAULT_LOW_MULTIPLIER,
};
use crate::domain::indicator::DEFAULT_BOLLINGER_WINDOW;
use crate::domain::strategy::threshold::DEFAULT_THRESHOLD;
use crate::domain::strategy::{
    BollingerRules, DEFAULT_SHARES, ExitPolicy, MacdBollingerRules, Strategy, StrategyKind,
    ThresholdRules,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_START_VALUE: f64 = 1_000_000.0;
pub const DEFAULT_HOLDING_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub index_symbol: String,
}

impl DataConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LevtraderError> {
        validate_data_config(config)?;
        Ok(DataConfig {
            dir: PathBuf::from(config.get_string("data", "dir").unwrap_or_default()),
            index_symbol: config
                .get_string("data", "index_symbol")
                .unwrap_or_else(|| DEFAULT_INDEX_SYMBOL.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub start_value: f64,
    pub end_date: Option<NaiveDate>,
    pub deleverage: DeleverageConfig,
    pub risk_free_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            start_value: DEFAULT_START_VALUE,
            end_date: None,
            deleverage: DeleverageConfig::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

impl SimulationConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LevtraderError> {
        validate_simulation_config(config)?;
        let max_iterations = config.get_int("simulation", "max_iterations", -1);
        Ok(SimulationConfig {
            start_value: config.get_double("simulation", "start_value", DEFAULT_START_VALUE),
            end_date: optional_date(config, "simulation", "end_date")?,
            deleverage: DeleverageConfig {
                max_leverage: config.get_double("simulation", "max_leverage", DEFAULT_MAX_LEVERAGE),
                max_iterations: usize::try_from(max_iterations).ok(),
            },
            risk_free_rate: config.get_double("simulation", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub kind: String,
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub shares: i64,
    /// Set for the fixed holding-period exit; always set for `threshold`.
    pub holding_days: Option<usize>,
    pub threshold: f64,
    pub bollinger_window: usize,
    pub predictions: Option<PathBuf>,
    pub stop_loss: Option<AdrStopLoss>,
}

impl StrategyConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LevtraderError> {
        validate_strategy_config(config)?;
        let kind = config
            .get_string("strategy", "kind")
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let start = config.get_string("strategy", "start_date").unwrap_or_default();
        let end = config.get_string("strategy", "end_date").unwrap_or_default();

        let holding_days = match config.get_int("strategy", "holding_days", 0) {
            0 if kind == "threshold" => Some(DEFAULT_HOLDING_DAYS),
            0 => None,
            days => Some(days as usize),
        };

        let stop_loss = config.get_bool("stop_loss", "enabled", false).then(|| AdrStopLoss {
            low: config.get_double("stop_loss", "low", DEFAULT_LOW_MULTIPLIER),
            high: config.get_double("stop_loss", "high", DEFAULT_HIGH_MULTIPLIER),
            window: config.get_int("stop_loss", "window", DEFAULT_ADR_WINDOW as i64) as usize,
        });

        Ok(StrategyConfig {
            symbols: config.get_list("strategy", "symbols"),
            start_date: parse_date("strategy", "start_date", &start)?,
            end_date: parse_date("strategy", "end_date", &end)?,
            shares: config.get_int("strategy", "shares", DEFAULT_SHARES),
            holding_days,
            threshold: config.get_double("strategy", "threshold", DEFAULT_THRESHOLD),
            bollinger_window: config.get_int("strategy", "bollinger_window", DEFAULT_BOLLINGER_WINDOW as i64)
                as usize,
            predictions: config.get_string("strategy", "predictions").map(PathBuf::from),
            stop_loss,
            kind,
        })
    }

    /// Whether the price request must be restricted to a single symbol.
    pub fn single_symbol_mode(&self) -> bool {
        self.kind == "threshold"
    }

    /// Assemble the strategy. `predictions` is only read by `threshold`.
    pub fn build(&self, predictions: BTreeMap<NaiveDate, f64>) -> Result<Strategy, LevtraderError> {
        let bollinger = BollingerRules {
            window: self.bollinger_window,
        };
        let kind = match self.kind.as_str() {
            "bollinger" => StrategyKind::Bollinger(bollinger),
            "macd_bollinger" => StrategyKind::MacdBollinger(MacdBollingerRules {
                bollinger,
                ..MacdBollingerRules::default()
            }),
            "threshold" => StrategyKind::Threshold(ThresholdRules::new(self.threshold, predictions)),
            other => {
                return Err(LevtraderError::StrategyInvalid {
                    reason: format!("unknown strategy '{}'", other),
                });
            }
        };

        let exit = match self.holding_days {
            Some(days) => ExitPolicy::HoldingPeriod(DayExit::new(days, self.stop_loss.clone().unwrap_or_default())),
            None => ExitPolicy::Signals {
                stop_loss: self.stop_loss.clone(),
            },
        };

        let strategy = Strategy::new(kind, exit).with_shares(self.shares);
        strategy.validate(&self.symbols)?;
        Ok(strategy)
    }
}
