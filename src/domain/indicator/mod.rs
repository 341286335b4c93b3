//! Indicator methods.
//!
//! Every method consumes an [`OhlcDataset`] and produces its derived columns
//! plus one recommendation signal aligned to the dataset's dates:
//! - `Method`: tagged enum of the available methods and their parameters
//! - `MethodOutput`: derived columns, recommendation, optional curve scores
//! - `ActiveMethod`: a method with its arbitration weight and vote mode

pub mod bollinger;
pub mod combined;
pub mod crash;
pub mod forecast;
pub mod ma_crossover;
pub mod macd;
pub mod rsi;

use std::fmt;

use crate::domain::arbitration::Ballot;
use crate::domain::error::ArbiterError;
use crate::domain::ohlcv::{OhlcDataset, PriceColumn};
use crate::domain::recommendation::Signal;
use crate::domain::series::Series;

pub use bollinger::BollingerParams;
pub use combined::CombinedPreset;
pub use crash::CrashParams;
pub use forecast::ForecastParams;
pub use ma_crossover::{MaCrossoverParams, MaKind};
pub use macd::MacdParams;
pub use rsi::{RsiParams, RsiSmoothing};

/// Everything a method may read.
#[derive(Debug, Clone, Copy)]
pub struct MethodInput<'a> {
    pub dataset: &'a OhlcDataset,
    pub price_column: PriceColumn,
    pub forecast: Option<&'a [f64]>,
}

impl<'a> MethodInput<'a> {
    pub fn new(dataset: &'a OhlcDataset, price_column: PriceColumn) -> Self {
        Self {
            dataset,
            price_column,
            forecast: None,
        }
    }

    pub fn with_forecast(mut self, forecast: Option<&'a [f64]>) -> Self {
        self.forecast = forecast;
        self
    }

    pub fn prices(&self) -> Series {
        self.dataset.prices(self.price_column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutput {
    pub method: String,
    pub columns: Vec<Series>,
    pub recommendation: Signal,
    /// Signed confidence in [-1, 1], for methods that support curve voting.
    pub scores: Option<Series>,
}

impl MethodOutput {
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Bollinger(BollingerParams),
    MaCrossover(MaCrossoverParams),
    Macd(MacdParams),
    Rsi(RsiParams),
    Forecast(ForecastParams),
    Crash(CrashParams),
}

impl Method {
    pub fn compute(&self, input: &MethodInput<'_>) -> Result<MethodOutput, ArbiterError> {
        match self {
            Method::Bollinger(p) => p.compute(input),
            Method::MaCrossover(p) => p.compute(input),
            Method::Macd(p) => p.compute(input),
            Method::Rsi(p) => p.compute(input),
            Method::Forecast(p) => p.compute(input),
            Method::Crash(p) => p.compute(input),
        }
    }

    pub fn validate(&self) -> Result<(), ArbiterError> {
        match self {
            Method::Bollinger(p) => p.validate(),
            Method::MaCrossover(p) => p.validate(),
            Method::Macd(p) => p.validate(),
            Method::Rsi(p) => p.validate(),
            Method::Forecast(p) => p.validate(),
            Method::Crash(p) => p.validate(),
        }
    }

    /// Config section / method list key.
    pub fn key(&self) -> &'static str {
        match self {
            Method::Bollinger(_) => "bollinger",
            Method::MaCrossover(_) => "ma_crossover",
            Method::Macd(_) => "macd",
            Method::Rsi(_) => "rsi",
            Method::Forecast(_) => "forecast",
            Method::Crash(_) => "crash",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Bollinger(p) => write!(f, "BBANDS({},{})", p.period, p.multiplier),
            Method::MaCrossover(p) => write!(f, "{}({},{})", p.kind, p.fast, p.slow),
            Method::Macd(p) => write!(f, "MACD({},{},{})", p.fast, p.slow, p.signal),
            Method::Rsi(p) => write!(f, "RSI {}({})", p.smoothing, p.period),
            Method::Forecast(p) => write!(f, "FORECAST({})", p.margin),
            Method::Crash(p) => write!(f, "CRASH({})", p.drop),
        }
    }
}

/// How a method's output is turned into a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteMode {
    /// Vote the categorical recommendation.
    #[default]
    Recommendation,
    /// Vote the sign of the threshold-curve score (falls back to the
    /// recommendation for methods without scores).
    Curve,
}

impl VoteMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "recommendation" | "cross" => Some(VoteMode::Recommendation),
            "curve" => Some(VoteMode::Curve),
            _ => None,
        }
    }
}

/// A method taking part in arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMethod {
    pub method: Method,
    pub weight: f64,
    pub vote: VoteMode,
}

impl ActiveMethod {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            weight: 1.0,
            vote: VoteMode::Recommendation,
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn voting(mut self, vote: VoteMode) -> Self {
        self.vote = vote;
        self
    }

    pub fn validate(&self) -> Result<(), ArbiterError> {
        if !(self.weight > 0.0 && self.weight.is_finite()) {
            return Err(ArbiterError::configuration(
                &format!("{}.weight", self.method.key()),
                "weight must be positive",
            ));
        }
        self.method.validate()
    }

    pub fn ballot(&self, output: &MethodOutput) -> Ballot {
        match (self.vote, &output.scores) {
            (VoteMode::Curve, Some(scores)) => {
                Ballot::scores(output.method.clone(), self.weight, scores.clone())
            }
            _ => Ballot::recommendations(
                output.method.clone(),
                self.weight,
                output.recommendation.clone(),
            ),
        }
    }
}

/// Shared window check for methods that need a minimum number of bars.
pub(crate) fn require_history(
    prices: &Series,
    needed: usize,
    label: &str,
) -> Result<(), ArbiterError> {
    if prices.len() < needed {
        return Err(ArbiterError::Window {
            series: format!("{} {}", label, prices.name),
            window: needed,
            available: prices.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ohlcv::{OhlcDataset, OhlcvBar};
    use chrono::NaiveDate;

    pub fn dataset(closes: &[f64]) -> OhlcDataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                adj_close: None,
                volume: 1000,
            })
            .collect();
        OhlcDataset::new("TEST", bars).unwrap()
    }
}
