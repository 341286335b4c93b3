//! Crash guard method.
//!
//! `sell` on any bar whose one-day relative change is a drop larger than the
//! configured fraction, `hold` otherwise. Never recommends `buy`.

use crate::domain::error::ArbiterError;
use crate::domain::recommendation::Signal;

use super::{MethodInput, MethodOutput, require_history};

pub const DEFAULT_DROP: f64 = 0.10;

#[derive(Debug, Clone, PartialEq)]
pub struct CrashParams {
    pub drop: f64,
}

impl Default for CrashParams {
    fn default() -> Self {
        Self { drop: DEFAULT_DROP }
    }
}

impl CrashParams {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(self.drop > 0.0 && self.drop < 1.0) {
            return Err(ArbiterError::configuration(
                "crash.drop",
                "drop must be in (0, 1)",
            ));
        }
        Ok(())
    }

    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        let prices = input.prices();
        require_history(&prices, 2, "CRASH")?;

        let returns = prices.pct_change();
        let never: Vec<Option<bool>> = returns.values.iter().map(|v| v.map(|_| false)).collect();
        let name = format!("CRASH {}", self.drop);
        let recommendation = Signal::from_masks(
            format!("{name} recommendation"),
            prices.dates.clone(),
            &never,
            &returns.below(-self.drop),
        );

        Ok(MethodOutput {
            method: name.clone(),
            columns: vec![returns.renamed(format!("{name} returns"))],
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

    #[test]
    fn sells_on_large_drop() {
        let ds = dataset(&[100.0, 95.0, 80.0, 79.0]);
        let out = CrashParams::default()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap();
        assert_eq!(
            out.recommendation.values,
            vec![
                None,
                Some(Recommendation::Hold),
                Some(Recommendation::Sell),
                Some(Recommendation::Hold)
            ]
        );
        assert_eq!(out.recommendation.count(Recommendation::Buy), 0);
    }

    #[test]
    fn needs_two_bars() {
        let ds = dataset(&[100.0]);
        let err = CrashParams::default()
            .compute(&MethodInput::new(&ds, PriceColumn::Close))
            .unwrap_err();
        assert!(matches!(err, ArbiterError::Window { .. }));
    }

    #[test]
    fn validate_range() {
        assert!(CrashParams { drop: 0.0 }.validate().is_err());
        assert!(CrashParams { drop: 0.25 }.validate().is_ok());
    }
}
