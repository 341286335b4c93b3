//! Categorical buy/sell/hold signals.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// -1 buy, 0 hold, +1 sell.
    pub fn vote(self) -> i8 {
        match self {
            Recommendation::Buy => -1,
            Recommendation::Hold => 0,
            Recommendation::Sell => 1,
        }
    }

    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Recommendation::Sell
        } else if value < 0.0 {
            Recommendation::Buy
        } else {
            Recommendation::Hold
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "BUY"),
            Recommendation::Sell => write!(f, "SELL"),
            Recommendation::Hold => write!(f, "HOLD"),
        }
    }
}

/// A Recommendation or Decision Signal: one optional value per date.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<Recommendation>>,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<Option<Recommendation>>,
    ) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Recommendation> {
        self.values.get(index).copied().flatten()
    }

    /// Signal built from crossing masks: `buy` where `buy_mask` is set,
    /// `sell` where `sell_mask` is set, `hold` otherwise, undefined where
    /// either mask is undefined.
    pub fn from_masks(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        buy_mask: &[Option<bool>],
        sell_mask: &[Option<bool>],
    ) -> Self {
        let values = buy_mask
            .iter()
            .zip(sell_mask)
            .map(|(buy, sell)| match (buy, sell) {
                (Some(true), _) => Some(Recommendation::Buy),
                (_, Some(true)) => Some(Recommendation::Sell),
                (Some(false), Some(false)) => Some(Recommendation::Hold),
                _ => None,
            })
            .collect();
        Self::new(name, dates, values)
    }

    /// Keep only the timestamps where the level changes into buy or sell;
    /// every other defined timestamp becomes hold.
    pub fn events(&self) -> Signal {
        let mut previous: Option<Recommendation> = None;
        let values = self
            .values
            .iter()
            .map(|value| {
                let event = value.map(|current| match current {
                    Recommendation::Buy | Recommendation::Sell if previous != Some(current) => {
                        current
                    }
                    _ => Recommendation::Hold,
                });
                previous = *value;
                event
            })
            .collect();
        Signal::new(format!("{} events", self.name), self.dates.clone(), values)
    }

    pub fn count(&self, recommendation: Recommendation) -> usize {
        self.values
            .iter()
            .filter(|v| **v == Some(recommendation))
            .count()
    }

    pub fn last_defined(&self) -> Option<Recommendation> {
        self.values.iter().rev().find_map(|v| *v)
    }
}
