//! Combined preset.
//!
//! Not a signal rule of its own: a named set of methods with fixed weights
//! that the arbitration engine fuses. Default members are MACD, RSI and
//! Bollinger Bands, each with weight 1.
//!
//! [`RegimeSwitch`] is the alternative to fixed weighting: it lets a single
//! member vote, MACD in ranging markets and Bollinger Bands in trending ones,
//! judged by the up/down movement ratio of the window.

use crate::domain::error::ArbiterError;

use super::{ActiveMethod, BollingerParams, MacdParams, Method, RsiParams, VoteMode};

pub const PRESET_NAME: &str = "combined";
pub const DEFAULT_REGIME_RATIO: f64 = 1.2;

const MEMBER_KEYS: [&str; 3] = ["macd", "rsi", "bollinger"];

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedPreset {
    pub members: Vec<ActiveMethod>,
}

impl Default for CombinedPreset {
    fn default() -> Self {
        Self::weighted(1.0, 1.0, 1.0)
    }
}

impl CombinedPreset {
    pub fn weighted(macd: f64, rsi: f64, bollinger: f64) -> Self {
        Self {
            members: vec![
                ActiveMethod::new(Method::Macd(MacdParams::default())).weighted(macd),
                ActiveMethod::new(Method::Rsi(RsiParams::default())).weighted(rsi),
                ActiveMethod::new(Method::Bollinger(BollingerParams::default()))
                    .weighted(bollinger),
            ],
        }
    }

    /// Replace the parameters of any member of the same kind.
    pub fn with_params(mut self, method: Method) -> Self {
        for member in &mut self.members {
            if member.method.key() == method.key() {
                member.method = method.clone();
            }
        }
        self
    }

    pub fn voting(mut self, key: &str, vote: VoteMode) -> Self {
        for member in &mut self.members {
            if member.method.key() == key {
                member.vote = vote;
            }
        }
        self
    }

    pub fn methods(&self) -> &[ActiveMethod] {
        &self.members
    }

    pub fn validate(&self) -> Result<(), ArbiterError> {
        self.members.iter().try_for_each(ActiveMethod::validate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeSwitch {
    /// Up/down ratio at and above which the market counts as trending.
    pub threshold: f64,
}

impl Default for RegimeSwitch {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REGIME_RATIO,
        }
    }
}

impl RegimeSwitch {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(self.threshold > 0.0 && self.threshold.is_finite()) {
            return Err(ArbiterError::configuration(
                "regime_ratio",
                format!("regime_ratio ({}) must be positive", self.threshold),
            ));
        }
        Ok(())
    }

    /// Key of the member that votes for a window with this up/down ratio.
    /// A window that never fell counts as trending.
    pub fn selected(&self, ratio_up_down: Option<f64>) -> &'static str {
        match ratio_up_down {
            Some(ratio) if ratio < self.threshold => "macd",
            _ => "bollinger",
        }
    }

    /// Methods outside the preset always vote.
    pub fn votes(&self, key: &str, ratio_up_down: Option<f64>) -> bool {
        !MEMBER_KEYS.contains(&key) || key == self.selected(ratio_up_down)
    }
}
