//! RSI (Relative Strength Index) method.
//!
//! Gains and losses are day-over-day changes split by sign, each smoothed
//! over n periods with SMA, EMA or Wilder smoothing:
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! If avg_loss == 0: RSI = 100, or 50 when avg_gain is also 0 (flat series).
//! Warmup: first n bars are undefined.
//!
//! The recommendation is the held level of a threshold cross with hysteresis:
//! `sell` once RSI rises above the upper threshold, released only when it
//! falls back below the upper release level; `buy` mirrors on the lower side.

use std::fmt;

use crate::domain::arbitration::{ThresholdCross, ThresholdCurve, recommend_threshold_cross};
use crate::domain::error::ArbiterError;
use crate::domain::series::Series;

use super::{MethodInput, MethodOutput};

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_UPPER: f64 = 70.0;
pub const DEFAULT_LOWER: f64 = 30.0;
pub const DEFAULT_HYSTERESIS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsiSmoothing {
    Sma,
    #[default]
    Ema,
    Wilder,
}

impl RsiSmoothing {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sma" => Some(RsiSmoothing::Sma),
            "ema" => Some(RsiSmoothing::Ema),
            "wilder" => Some(RsiSmoothing::Wilder),
            _ => None,
        }
    }

    fn apply(self, series: &Series, window: usize) -> Result<Series, ArbiterError> {
        match self {
            RsiSmoothing::Sma => series.sma(window),
            RsiSmoothing::Ema => series.ema(window),
            RsiSmoothing::Wilder => series.wilder(window),
        }
    }
}

impl fmt::Display for RsiSmoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RsiSmoothing::Sma => write!(f, "SMA"),
            RsiSmoothing::Ema => write!(f, "EMA"),
            RsiSmoothing::Wilder => write!(f, "WILDER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiParams {
    pub period: usize,
    pub smoothing: RsiSmoothing,
    pub thresholds: ThresholdCross,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            smoothing: RsiSmoothing::default(),
            thresholds: ThresholdCross::with_hysteresis(
                DEFAULT_UPPER,
                DEFAULT_LOWER,
                DEFAULT_HYSTERESIS,
            ),
        }
    }
}

impl RsiParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.period == 0 {
            return Err(ArbiterError::configuration(
                "rsi.period",
                "period must be at least 1",
            ));
        }
        self.thresholds.validate("rsi")
    }

    pub fn rsi(&self, prices: &Series) -> Result<Series, ArbiterError> {
        let change = prices.change();
        let gains = self.smoothing.apply(&change.clip_lower(0.0), self.period)?;
        let losses = self
            .smoothing
            .apply(&change.clip_upper(0.0).abs(), self.period)?;

        let values = gains
            .values
            .iter()
            .zip(&losses.values)
            .map(|(gain, loss)| match (gain, loss) {
                (Some(gain), Some(loss)) => Some(rsi_value(*gain, *loss)),
                _ => None,
            })
            .collect();

        Ok(Series::new(
            format!("RSI {}({})", self.smoothing, self.period),
            prices.dates.clone(),
            values,
        ))
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let rsi = self.rsi(&input.prices())?;
        let mut recommendation = recommend_threshold_cross(&rsi, &self.thresholds);
        recommendation.name = format!("{} recommendation", rsi.name);
        let scores = ThresholdCurve {
            upper: self.thresholds.upper,
            lower: self.thresholds.lower,
        }
        .scores(&rsi);

        Ok(MethodOutput {
            method: rsi.name.clone(),
            scores: Some(scores.renamed(format!("{} score", rsi.name))),
            columns: vec![rsi],
            recommendation,
        })
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
