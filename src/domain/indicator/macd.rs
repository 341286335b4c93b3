//! MACD (Moving Average Convergence Divergence) method.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! `buy` when the histogram turns from negative to positive, `sell` on the
//! reverse. With a histogram band configured the histogram is instead voted
//! through a threshold cross, where a strongly positive histogram is a buy.
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars

use crate::domain::arbitration::{ThresholdCross, recommend_threshold_cross};
use crate::domain::error::ArbiterError;
use crate::domain::recommendation::Signal;

use super::{MethodInput, MethodOutput};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub histogram_band: Option<ThresholdCross>,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            histogram_band: None,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.fast == 0 || self.slow == 0 || self.signal == 0 {
            return Err(ArbiterError::configuration(
                "macd",
                "periods must be at least 1",
            ));
        }
        if self.fast >= self.slow {
            return Err(ArbiterError::configuration(
                "macd.fast",
                format!("fast ({}) must be less than slow ({})", self.fast, self.slow),
            ));
        }
        if let Some(band) = &self.histogram_band {
            band.validate("macd.histogram_band")?;
        }
        Ok(())
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let prices = input.prices();
        let line = prices.ema(self.fast)?.sub(&prices.ema(self.slow)?)?;
        let signal = line.ema(self.signal)?;
        let histogram = line.sub(&signal)?;

        let name = format!("MACD {}/{}/{}", self.fast, self.slow, self.signal);
        let recommendation = match &self.histogram_band {
            Some(band) => {
                let mut banded = recommend_threshold_cross(&histogram.scale(-1.0), band);
                banded.name = format!("{name} recommendation");
                banded
            }
            None => Signal::from_masks(
                format!("{name} recommendation"),
                prices.dates.clone(),
                &histogram.turns_positive(),
                &histogram.turns_negative(),
            ),
        };

        Ok(MethodOutput {
            method: name.clone(),
            columns: vec![
                line.renamed(format!("{name} line")),
                signal.renamed(format!("{name} signal")),
                histogram.renamed(format!("{name} histogram")),
            ],
            recommendation,
            scores: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::dataset;
    use crate::domain::ohlcv::PriceColumn;
    use crate::domain::recommendation::Recommendation;
    use approx::assert_relative_eq;

    fn small() -> MacdParams {
        MacdParams {
            fast: 2,
            slow: 4,
            signal: 2,
            histogram_band: None,
        }
    }

    #[test]
    fn warmup_period() {
        let closes: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let ds = dataset(&closes);
        let out = small()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        let hist = out.column("MACD 2/4/2 histogram").unwrap();
        // slow - 1 + signal - 1 = 4
        assert!(hist.values[..4].iter().all(Option::is_none));
        assert!(hist.values[4..].iter().all(Option::is_some));
    }

    #[test]
    fn linear_series_converges_to_constant_line() {
        let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        let ds = dataset(&closes);
        let out = small()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        let line = out.column("MACD 2/4/2 line").unwrap();
        // lag of EMA(n) on a unit slope is (n-1)/2, so the line tends to 1.0
        assert_relative_eq!(line.values[59].unwrap(), 1.0, epsilon = 1e-6);
        let hist = out.column("MACD 2/4/2 histogram").unwrap();
        assert_relative_eq!(hist.values[59].unwrap(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn reversal_emits_buy_then_sell() {
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 - 0.2 * (i * i) as f64).collect();
        let bottom = closes[14];
        closes.extend((1..=15).map(|i| bottom + 0.3 * (i * i) as f64));
        let top = closes[29];
        closes.extend((1..=15).map(|i| top - 0.3 * (i * i) as f64));
        let ds = dataset(&closes);
        let out = small()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        let signal = &out.recommendation;
        assert_eq!(signal.values[15], Some(Recommendation::Buy));
        assert_eq!(signal.values[30], Some(Recommendation::Sell));
        assert_eq!(signal.count(Recommendation::Buy), 1);
        assert_eq!(signal.count(Recommendation::Sell), 1);
    }

    #[test]
    fn rise_from_flat_zero_histogram_is_not_a_buy() {
        let mut closes: Vec<f64> = vec![100.0; 10];
        closes.extend([101.0, 102.0, 103.0]);
        let ds = dataset(&closes);
        let out = small()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        let hist = out.column("MACD 2/4/2 histogram").unwrap();
        assert_eq!(hist.values[9], Some(0.0));
        assert!(hist.values[10].unwrap() > 0.0);
        assert_eq!(out.recommendation.count(Recommendation::Buy), 0);
    }

    #[test]
    fn histogram_band_votes_positive_as_buy() {
        let mut closes: Vec<f64> = vec![100.0; 10];
        closes.extend([110.0, 125.0, 145.0]);
        let ds = dataset(&closes);
        let params = MacdParams {
            histogram_band: Some(ThresholdCross::normalized(0.5, 0.5, 0.1)),
            ..small()
        };
        let out = params
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        assert_eq!(out.recommendation.last_defined(), Some(Recommendation::Buy));
    }

    #[test]
    fn too_few_bars() {
        let ds = dataset(&[1.0, 2.0, 3.0, 4.0]);
        let err = small()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap_err();
        assert!(matches!(err, ArbiterError::Window { .. }));
    }

    #[test]
    fn validate_rejects_fast_not_below_slow() {
        let params = MacdParams {
            fast: 26,
            slow: 26,
            ..MacdParams::default()
        };
        assert!(params.validate().is_err());
    }
}
