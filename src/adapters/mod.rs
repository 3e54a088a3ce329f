//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod file_config_adapter;
pub mod order_csv_adapter;
pub mod prediction_csv_adapter;
