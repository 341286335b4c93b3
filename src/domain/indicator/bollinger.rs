//! Bollinger Bands method.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation. `sell` when the close crosses
//! above the upper band, `buy` when it crosses below the lower band, `hold`
//! otherwise. A flat series has zero-width bands and never crosses them.
//!
//! Default parameters: period=20, multiplier=2.0

use crate::domain::arbitration::recommend_threshold_curve;
use crate::domain::error::ArbiterError;
use crate::domain::recommendation::Signal;

use super::{MethodInput, MethodOutput};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            multiplier: DEFAULT_MULTIPLIER,
        }
    }
}

impl BollingerParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.period == 0 {
            return Err(ArbiterError::configuration(
                "bollinger.period",
                "period must be at least 1",
            ));
        }
        if !(self.multiplier > 0.0 && self.multiplier.is_finite()) {
            return Err(ArbiterError::configuration(
                "bollinger.multiplier",
                "multiplier must be positive",
            ));
        }
        Ok(())
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let prices = input.prices();
        let middle = prices.sma(self.period)?;
        let width = prices.rolling_std(self.period)?.scale(self.multiplier);
        let upper = middle.add(&width)?;
        let lower = middle.sub(&width)?;

        let sell = prices.sub(&upper)?.crosses_above(0.0);
        let buy = prices.sub(&lower)?.crosses_below(0.0);
        let name = format!("BBANDS {}", self.period);
        let recommendation =
            Signal::from_masks(format!("{name} recommendation"), prices.dates.clone(), &buy, &sell);
        let scores = recommend_threshold_curve(&prices, &lower, &upper)?;

        Ok(MethodOutput {
            method: name.clone(),
            columns: vec![
                middle.renamed(format!("{name} middle")),
                upper.renamed(format!("{name} upper")),
                lower.renamed(format!("{name} lower")),
            ],
            recommendation,
            scores: Some(scores.renamed(format!("{name} score"))),
        })
    }
}
