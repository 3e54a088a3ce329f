//! Configuration validation.
//!
//! Checks every recognised key before a run starts so that bad input fails
//! fast with the section and key that caused it.

use crate::domain::error::LevtraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_KINDS: [&str; 3] = ["bollinger", "macd_bollinger", "threshold"];

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    require(config, "data", "dir")?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    validate_start_value(config)?;
    validate_max_leverage(config)?;
    validate_max_iterations(config)?;
    validate_risk_free_rate(config)?;
    optional_date(config, "simulation", "end_date")?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    validate_kind(config)?;
    validate_symbols(config)?;
    validate_dates(config)?;
    validate_positive_int(config, "strategy", "shares")?;
    validate_positive_int(config, "strategy", "holding_days")?;
    validate_bollinger_window(config)?;
    validate_threshold(config)?;
    validate_stop_loss(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> LevtraderError {
    LevtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, LevtraderError> {
    config
        .get_string(section, key)
        .ok_or_else(|| LevtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

pub(crate) fn parse_date(section: &str, key: &str, value: &str) -> Result<NaiveDate, LevtraderError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, &format!("invalid {} format, expected YYYY-MM-DD", key)))
}

pub(crate) fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, LevtraderError> {
    config
        .get_string(section, key)
        .map(|v| parse_date(section, key, &v))
        .transpose()
}

/// Numeric keys must parse when present; the typed getters would silently
/// fall back to the default otherwise.
fn parse_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, LevtraderError> {
    config
        .get_string(section, key)
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| invalid(section, key, &format!("'{}' is not a number", v)))
        })
        .transpose()
}

fn validate_start_value(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "simulation", "start_value")? {
        if v <= 0.0 || !v.is_finite() {
            return Err(invalid("simulation", "start_value", "start_value must be positive"));
        }
    }
    Ok(())
}

fn validate_max_leverage(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "simulation", "max_leverage")? {
        if v <= 0.0 || !v.is_finite() {
            return Err(invalid("simulation", "max_leverage", "max_leverage must be positive"));
        }
    }
    Ok(())
}

fn validate_max_iterations(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "simulation", "max_iterations")? {
        if v < 0.0 || v.fract() != 0.0 {
            return Err(invalid(
                "simulation",
                "max_iterations",
                "max_iterations must be a non-negative integer",
            ));
        }
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "simulation", "risk_free_rate")? {
        if !(0.0..1.0).contains(&v) {
            return Err(invalid("simulation", "risk_free_rate", "risk_free_rate must be between 0 and 1"));
        }
    }
    Ok(())
}

fn validate_kind(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    let kind = require(config, "strategy", "kind")?;
    if !STRATEGY_KINDS.contains(&kind.trim().to_lowercase().as_str()) {
        return Err(invalid(
            "strategy",
            "kind",
            &format!("unknown strategy '{}', expected one of {}", kind, STRATEGY_KINDS.join(", ")),
        ));
    }
    if kind.trim().eq_ignore_ascii_case("threshold") {
        require(config, "strategy", "predictions")?;
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if config.get_list("strategy", "symbols").is_empty() {
        return Err(LevtraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    let start = parse_date("strategy", "start_date", &require(config, "strategy", "start_date")?)?;
    let end = parse_date("strategy", "end_date", &require(config, "strategy", "end_date")?)?;
    if start > end {
        return Err(invalid("strategy", "start_date", "start_date must not be after end_date"));
    }
    Ok(())
}

fn validate_positive_int(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, section, key)? {
        if v < 1.0 || v.fract() != 0.0 {
            return Err(invalid(section, key, &format!("{} must be a positive integer", key)));
        }
    }
    Ok(())
}

fn validate_bollinger_window(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "strategy", "bollinger_window")? {
        if v < 2.0 || v.fract() != 0.0 {
            return Err(invalid("strategy", "bollinger_window", "bollinger_window must be at least 2"));
        }
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    if let Some(v) = parse_number(config, "strategy", "threshold")? {
        if v < 0.0 {
            return Err(invalid("strategy", "threshold", "threshold must be non-negative"));
        }
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), LevtraderError> {
    for key in ["low", "high"] {
        if let Some(v) = parse_number(config, "stop_loss", key)? {
            if v < 0.0 {
                return Err(invalid("stop_loss", key, &format!("{} multiplier must be non-negative", key)));
            }
        }
    }
    validate_positive_int(config, "stop_loss", "window")
}
