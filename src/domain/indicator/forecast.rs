//! Forecast-compare method.
//!
//! Compares the terminal value of an externally supplied forecast against the
//! last observed price: `buy` when the forecast exceeds it by more than the
//! margin, `sell` when it falls short by more than the margin, `hold`
//! otherwise. The recommendation is defined only at the last observed bar.
//!
//! The forecast must have exactly one value per date of the dataset's
//! prediction horizon.

use crate::domain::error::ArbiterError;
use crate::domain::recommendation::{Recommendation, Signal};
use crate::domain::series::Series;

use super::{MethodInput, MethodOutput};

pub const DEFAULT_MARGIN: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastParams {
    /// Relative distance from the last close that counts as a move.
    pub margin: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
        }
    }
}

impl ForecastParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(self.margin >= 0.0 && self.margin.is_finite()) {
            return Err(ArbiterError::configuration(
                "forecast.margin",
                "margin must be non-negative",
            ));
        }
        Ok(())
    }

    pub fn classify(&self, last_price: f64, terminal: f64) -> Recommendation {
        if terminal > last_price * (1.0 + self.margin) {
            Recommendation::Buy
        } else if terminal < last_price * (1.0 - self.margin) {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let forecast = input.forecast.ok_or_else(|| {
            ArbiterError::configuration("forecast", "no forecast sequence was supplied")
        })?;
        let horizon = &input.dataset.horizon;
        if horizon.is_empty() {
            return Err(ArbiterError::configuration(
                "prediction_length",
                "the dataset has no forecast horizon",
            ));
        }
        if forecast.len() != horizon.len() {
            return Err(ArbiterError::Length {
                left: "forecast".to_string(),
                right: "forecast horizon".to_string(),
                left_len: forecast.len(),
                right_len: horizon.len(),
            });
        }

        let prices = input.prices();
        let (last_index, last_price) = prices.last_defined().ok_or_else(|| ArbiterError::Data {
            reason: format!("no observed prices for {}", input.dataset.symbol),
        })?;
        // non-empty: horizon is non-empty and lengths match
        let terminal = forecast[forecast.len() - 1];

        let mut values = vec![None; prices.len()];
        values[last_index] = Some(self.classify(last_price, terminal));
        let name = "FORECAST".to_string();

        Ok(MethodOutput {
            method: name.clone(),
            columns: vec![Series::from_values(
                format!("{name} values"),
                horizon.clone(),
                forecast.to_vec(),
            )],
            recommendation: Signal::new(
                format!("{name} recommendation"),
                prices.dates.clone(),
                values,
            ),
            scores: None,
        })
    }
}
