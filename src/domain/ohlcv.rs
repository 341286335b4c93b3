//! OHLC bar and dataset representation.

use chrono::NaiveDate;
use std::fmt;

use super::error::ArbiterError;
use super::series::Series;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: i64,
}

/// Which column is used as the closing price of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceColumn {
    Close,
    /// Adjusted close, falling back to close for bars that lack it.
    #[default]
    AdjustedClose,
}

impl PriceColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "close" => Some(PriceColumn::Close),
            "adj_close" | "adjusted_close" | "adjusted" => Some(PriceColumn::AdjustedClose),
            _ => None,
        }
    }

    pub fn price(&self, bar: &OhlcvBar) -> f64 {
        match self {
            PriceColumn::Close => bar.close,
            PriceColumn::AdjustedClose => bar.adj_close.unwrap_or(bar.close),
        }
    }

    /// Opening price on the same basis as [`PriceColumn::price`]: the
    /// adjusted variant scales the open by the bar's adjustment factor.
    pub fn open(&self, bar: &OhlcvBar) -> f64 {
        match (self, bar.adj_close) {
            (PriceColumn::AdjustedClose, Some(adj)) if bar.close != 0.0 => {
                bar.open * adj / bar.close
            }
            _ => bar.open,
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceColumn::Close => write!(f, "close"),
            PriceColumn::AdjustedClose => write!(f, "adj_close"),
        }
    }
}

/// Timestamp-indexed OHLC table for one symbol.
///
/// `horizon` holds placeholder trading dates appended after the last bar for
/// forecasting; they never carry OHLC values.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcDataset {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub horizon: Vec<NaiveDate>,
}

impl OhlcDataset {
    /// Build a dataset, rejecting bars whose dates are not strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, ArbiterError> {
        let symbol = symbol.into();
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ArbiterError::Data {
                reason: format!(
                    "{}: dates must be strictly increasing ({} then {})",
                    symbol, pair[0].date, pair[1].date
                ),
            });
        }
        Ok(Self {
            symbol,
            bars,
            horizon: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn prices(&self, column: PriceColumn) -> Series {
        Series::from_values(
            column.to_string(),
            self.dates(),
            self.bars.iter().map(|b| column.price(b)).collect(),
        )
    }

    pub fn average_volume(&self) -> f64 {
        if self.bars.is_empty() {
            return 0.0;
        }
        self.bars.iter().map(|b| b.volume as f64).sum::<f64>() / self.bars.len() as f64
    }

    /// Copy of this dataset restricted to `bars[range]`, horizon dropped.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[range].to_vec(),
            horizon: Vec::new(),
        }
    }
}
