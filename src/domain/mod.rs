//! Core domain types and logic.

pub mod allocation;
pub mod config_validation;
pub mod day_exit;
pub mod deleverage;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod order;
pub mod price_table;
pub mod run_config;
pub mod signal;
pub mod simulation;
pub mod stop_loss;
pub mod strategy;
pub mod trade_matrix;
