//! Arbitration engine: turns indicator values into recommendations and fuses
//! several recommendations into one decision per timestamp.
//!
//! # Threshold cross
//!
//! A left-to-right scan with an explicit [`CrossState`]. From neutral, a value
//! above `upper` arms `sell`; the state stays sell-armed until the value drops
//! below `release_upper`. `buy` mirrors this at `lower` / `release_lower`.
//! The emitted level is the armed side, or `hold` while neutral.
//!
//! # Threshold curve
//!
//! A signed score of the value's distance from the midpoint of the band,
//! normalised by half the band width and clipped to [-1, 1]. Positive leans
//! `sell`, negative leans `buy`.
//!
//! # Fusion
//!
//! Each [`Ballot`] votes -1 (buy), 0 (hold) or +1 (sell), scaled by its weight.
//! The decision is the sign of the sum. An exact tie is `hold`; a timestamp
//! where every ballot is undefined has an undefined decision.

use chrono::NaiveDate;

use super::error::ArbiterError;
use super::recommendation::{Recommendation, Signal};
use super::series::Series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// Thresholds are absolute values.
    #[default]
    Absolute,
    /// Upper levels are fractions of the series maximum, lower levels
    /// fractions of the series minimum.
    Normalized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCross {
    pub upper: f64,
    pub lower: f64,
    pub release_upper: f64,
    pub release_lower: f64,
    pub mode: ThresholdMode,
}

/// Resolved absolute levels for one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub upper: f64,
    pub lower: f64,
    pub release_upper: f64,
    pub release_lower: f64,
}

impl ThresholdCross {
    /// Absolute thresholds with release levels `band` inside each of them.
    pub fn with_hysteresis(upper: f64, lower: f64, band: f64) -> Self {
        Self {
            upper,
            lower,
            release_upper: upper - band,
            release_lower: lower + band,
            mode: ThresholdMode::Absolute,
        }
    }

    /// Normalised thresholds; release levels are `release` times each threshold.
    pub fn normalized(upper: f64, lower: f64, release: f64) -> Self {
        Self {
            upper,
            lower,
            release_upper: upper * release,
            release_lower: lower * release,
            mode: ThresholdMode::Normalized,
        }
    }

    pub fn validate(&self, parameter: &str) -> Result<(), ArbiterError> {
        let levels = [self.upper, self.lower, self.release_upper, self.release_lower];
        if levels.iter().any(|v| !v.is_finite()) {
            return Err(ArbiterError::configuration(
                parameter,
                "thresholds must be finite",
            ));
        }
        match self.mode {
            ThresholdMode::Absolute => {
                if self.lower >= self.upper {
                    return Err(ArbiterError::configuration(
                        parameter,
                        format!(
                            "threshold_lower ({}) must be below threshold_upper ({})",
                            self.lower, self.upper
                        ),
                    ));
                }
                if !(self.release_upper < self.upper
                    && self.release_lower > self.lower
                    && self.release_lower <= self.release_upper)
                {
                    return Err(ArbiterError::configuration(
                        parameter,
                        "release levels must lie strictly inside the thresholds",
                    ));
                }
            }
            ThresholdMode::Normalized => {
                let inside = |threshold: f64, release: f64| {
                    threshold > 0.0 && threshold <= 1.0 && release >= 0.0 && release < threshold
                };
                if !(inside(self.upper, self.release_upper)
                    && inside(self.lower, self.release_lower))
                {
                    return Err(ArbiterError::configuration(
                        parameter,
                        "normalized thresholds must be in (0, 1] with smaller release fractions",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn resolve(&self, series: &Series) -> Bounds {
        match self.mode {
            ThresholdMode::Absolute => Bounds {
                upper: self.upper,
                lower: self.lower,
                release_upper: self.release_upper,
                release_lower: self.release_lower,
            },
            ThresholdMode::Normalized => {
                let max = series.column_max().unwrap_or(0.0);
                let min = series.column_min().unwrap_or(0.0);
                Bounds {
                    upper: max * self.upper,
                    lower: min * self.lower,
                    release_upper: max * self.release_upper,
                    release_lower: min * self.release_lower,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossState {
    #[default]
    Neutral,
    SellArmed,
    BuyArmed,
}

impl CrossState {
    pub fn level(self) -> Recommendation {
        match self {
            CrossState::Neutral => Recommendation::Hold,
            CrossState::SellArmed => Recommendation::Sell,
            CrossState::BuyArmed => Recommendation::Buy,
        }
    }
}

/// One step of the threshold-cross scan.
pub fn cross_step(state: CrossState, value: f64, bounds: &Bounds) -> (CrossState, Recommendation) {
    let from_neutral = |value: f64| {
        if value > bounds.upper {
            CrossState::SellArmed
        } else if value < bounds.lower {
            CrossState::BuyArmed
        } else {
            CrossState::Neutral
        }
    };

    let next = match state {
        CrossState::Neutral => from_neutral(value),
        CrossState::SellArmed if value < bounds.release_upper => from_neutral(value),
        CrossState::BuyArmed if value > bounds.release_lower => from_neutral(value),
        armed => armed,
    };
    (next, next.level())
}

/// Threshold-cross recommendation over a whole series. Undefined values
/// produce undefined recommendations and leave the state untouched.
pub fn recommend_threshold_cross(series: &Series, params: &ThresholdCross) -> Signal {
    let bounds = params.resolve(series);
    let mut state = CrossState::default();
    let values = series
        .values
        .iter()
        .map(|value| {
            let value = (*value)?;
            let (next, level) = cross_step(state, value, &bounds);
            state = next;
            Some(level)
        })
        .collect();

    Signal::new(
        format!("{} threshold cross", series.name),
        series.dates.clone(),
        values,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCurve {
    pub upper: f64,
    pub lower: f64,
}

impl ThresholdCurve {
    pub fn scores(&self, series: &Series) -> Series {
        Series::new(
            format!("{} threshold curve", series.name),
            series.dates.clone(),
            series
                .values
                .iter()
                .map(|v| v.map(|v| curve_score(v, self.lower, self.upper)))
                .collect(),
        )
    }
}

/// Normalised distance from the midpoint of [lower, upper], clipped to [-1, 1].
/// A degenerate band (zero width) scores 0.
pub fn curve_score(value: f64, lower: f64, upper: f64) -> f64 {
    let half_width = (upper - lower) / 2.0;
    if half_width <= 0.0 || !half_width.is_finite() {
        return 0.0;
    }
    let mid = (upper + lower) / 2.0;
    ((value - mid) / half_width).clamp(-1.0, 1.0)
}

/// Threshold curve against per-timestamp bands.
pub fn recommend_threshold_curve(
    series: &Series,
    lower: &Series,
    upper: &Series,
) -> Result<Series, ArbiterError> {
    let n = series.len().min(lower.len()).min(upper.len());
    if n == 0 {
        return Err(ArbiterError::Length {
            left: series.name.clone(),
            right: format!("{} / {}", lower.name, upper.name),
            left_len: series.len(),
            right_len: lower.len().min(upper.len()),
        });
    }

    let values = (0..n)
        .map(|i| match (series.values[i], lower.values[i], upper.values[i]) {
            (Some(v), Some(lo), Some(hi)) => Some(curve_score(v, lo, hi)),
            _ => None,
        })
        .collect();

    Ok(Series::new(
        format!("{} threshold curve", series.name),
        series.dates[..n].to_vec(),
        values,
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteSource {
    Recommendations(Signal),
    Scores(Series),
}

/// One method's contribution to the fused decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Ballot {
    pub name: String,
    pub weight: f64,
    pub source: VoteSource,
}

impl Ballot {
    pub fn recommendations(name: impl Into<String>, weight: f64, signal: Signal) -> Self {
        Self {
            name: name.into(),
            weight,
            source: VoteSource::Recommendations(signal),
        }
    }

    pub fn scores(name: impl Into<String>, weight: f64, scores: Series) -> Self {
        Self {
            name: name.into(),
            weight,
            source: VoteSource::Scores(scores),
        }
    }

    /// Raw indicator values voted through a threshold cross.
    pub fn threshold_cross(
        name: impl Into<String>,
        weight: f64,
        values: &Series,
        params: &ThresholdCross,
    ) -> Self {
        Self::recommendations(name, weight, recommend_threshold_cross(values, params))
    }

    fn vote_at(&self, index: usize, arbiter: &Arbiter) -> Option<i8> {
        match &self.source {
            VoteSource::Recommendations(signal) => signal.get(index).map(Recommendation::vote),
            VoteSource::Scores(scores) => scores.get(index).map(|s| arbiter.binarize(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arbiter {
    pub dead_zone: f64,
}

impl Default for Arbiter {
    fn default() -> Self {
        Arbiter { dead_zone: 0.1 }
    }
}

impl Arbiter {
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(ArbiterError::configuration(
                "dead_zone",
                "dead_zone must be in [0, 1)",
            ));
        }
        Ok(())
    }

    /// Scores inside the dead-zone vote hold.
    pub fn binarize(&self, score: f64) -> i8 {
        if score.abs() <= self.dead_zone {
            0
        } else if score > 0.0 {
            1
        } else {
            -1
        }
    }

    pub fn arbitrate(&self, dates: &[NaiveDate], ballots: &[Ballot]) -> Signal {
        let values = (0..dates.len())
            .map(|i| {
                let mut total = 0.0;
                let mut defined = false;
                for ballot in ballots {
                    if let Some(vote) = ballot.vote_at(i, self) {
                        defined = true;
                        total += vote as f64 * ballot.weight;
                    }
                }
                defined.then(|| Recommendation::from_sign(total))
            })
            .collect();

        Signal::new("decision", dates.to_vec(), values)
    }
}
