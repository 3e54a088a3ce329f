//! Forecast files for the threshold strategy: CSV with Date, Prediction.

use crate::domain::error::LevtraderError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PredictionRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Prediction")]
    prediction: f64,
}

/// Later rows win when a date repeats.
pub fn load_predictions<P: AsRef<Path>>(path: P) -> Result<BTreeMap<NaiveDate, f64>, LevtraderError> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| LevtraderError::StrategyInvalid {
            reason: format!("failed to read predictions {}: {}", path.display(), e),
        })?;

    let mut predictions = BTreeMap::new();
    for (i, result) in rdr.deserialize::<PredictionRecord>().enumerate() {
        let record = result.map_err(|e| LevtraderError::StrategyInvalid {
            reason: format!("predictions row {}: {}", i + 1, e),
        })?;
        let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").map_err(|e| {
            LevtraderError::StrategyInvalid {
                reason: format!("predictions row {}: invalid date '{}': {}", i + 1, record.date, e),
            }
        })?;
        predictions.insert(date, record.prediction);
    }
    Ok(predictions)
}
