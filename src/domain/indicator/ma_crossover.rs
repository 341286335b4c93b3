//! Moving-average crossover method.
//!
//! `buy` when the fast average crosses above the slow one, `sell` when it
//! crosses below. Both averages use the same kind (SMA or EMA).

use std::fmt;

use crate::domain::error::ArbiterError;
use crate::domain::recommendation::Signal;
use crate::domain::series::Series;

use super::{MethodInput, MethodOutput};

pub const DEFAULT_FAST: usize = 10;
pub const DEFAULT_SLOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaKind {
    #[default]
    Sma,
    Ema,
}

impl MaKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sma" => Some(MaKind::Sma),
            "ema" => Some(MaKind::Ema),
            _ => None,
        }
    }

    pub fn apply(self, series: &Series, window: usize) -> Result<Series, ArbiterError> {
        match self {
            MaKind::Sma => series.sma(window),
            MaKind::Ema => series.ema(window),
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaKind::Sma => write!(f, "SMA"),
            MaKind::Ema => write!(f, "EMA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossoverParams {
    pub fast: usize,
    pub slow: usize,
    pub kind: MaKind,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            kind: MaKind::Sma,
        }
    }
}

impl MaCrossoverParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.fast == 0 || self.slow == 0 {
            return Err(ArbiterError::configuration(
                "ma_crossover",
                "periods must be at least 1",
            ));
        }
        if self.fast >= self.slow {
            return Err(ArbiterError::configuration(
                "ma_crossover.fast",
                format!("fast ({}) must be less than slow ({})", self.fast, self.slow),
            ));
        }
        Ok(())
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let prices = input.prices();
        let fast = self.kind.apply(&prices, self.fast)?;
        let slow = self.kind.apply(&prices, self.slow)?;
        let spread = fast.sub(&slow)?;

        let name = format!("{} crossover {}/{}", self.kind, self.fast, self.slow);
        let recommendation = Signal::from_masks(
            format!("{name} recommendation"),
            prices.dates.clone(),
            &fast.crosses_above_series(&slow)?,
            &fast.crosses_below_series(&slow)?,
        );

        Ok(MethodOutput {
            method: name.clone(),
            columns: vec![
                fast.renamed(format!("{name} fast")),
                slow.renamed(format!("{name} slow")),
                spread.renamed(format!("{name} spread")),
            ],
            recommendation,
            scores: None,
        })
    }
}
