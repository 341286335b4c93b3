//! Window bounding, trading calendar and forecast horizon.
//!
//! Every operation here keeps bars in their input order and never
//! invents OHLC values. Horizon dates are bare timestamps.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;

use super::error::ArbiterError;
use super::ohlcv::OhlcDataset;

/// Keep the latest `length` bars. A length at or above the dataset size
/// keeps everything.
pub fn truncate_range(dataset: &OhlcDataset, length: usize) -> OhlcDataset {
    let start = dataset.len().saturating_sub(length);
    dataset.slice(start..dataset.len())
}

/// Keep bars dated inside `[start, end]`; `None` leaves that side open.
pub fn bound_window(
    dataset: &OhlcDataset,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<OhlcDataset, ArbiterError> {
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ArbiterError::configuration(
                "start_date",
                format!("start date {s} is after end date {e}"),
            ));
        }
    }
    let from = match start {
        Some(s) => dataset.bars.partition_point(|b| b.date < s),
        None => 0,
    };
    let to = match end {
        Some(e) => dataset.bars.partition_point(|b| b.date <= e),
        None => dataset.len(),
    };
    Ok(dataset.slice(from..to.max(from)))
}

/// Weekdays minus listed holidays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradingCalendar {
    pub holidays: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// First trading day strictly after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date + Duration::days(1);
        while !self.is_trading_day(next) {
            next += Duration::days(1);
        }
        next
    }

    /// First trading day strictly before `date`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut prev = date - Duration::days(1);
        while !self.is_trading_day(prev) {
            prev -= Duration::days(1);
        }
        prev
    }

    /// Move `days` trading days forward (positive) or back (negative).
    pub fn add_trading_days(&self, date: NaiveDate, days: i64) -> NaiveDate {
        let mut current = date;
        for _ in 0..days.unsigned_abs() {
            current = if days > 0 {
                self.next_trading_day(current)
            } else {
                self.previous_trading_day(current)
            };
        }
        current
    }

    /// The `n` trading days following `date`.
    pub fn trading_days_after(&self, date: NaiveDate, n: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::with_capacity(n);
        let mut current = date;
        for _ in 0..n {
            current = self.next_trading_day(current);
            dates.push(current);
        }
        dates
    }
}

/// Append `prediction_length` placeholder trading dates after the last bar.
pub fn extend_horizon(
    dataset: &OhlcDataset,
    prediction_length: usize,
    calendar: &TradingCalendar,
) -> Result<OhlcDataset, ArbiterError> {
    let Some(last) = dataset.bars.last() else {
        return Err(ArbiterError::NoData {
            symbol: dataset.symbol.clone(),
        });
    };
    let mut extended = dataset.clone();
    extended.horizon = calendar.trading_days_after(last.date, prediction_length);
    Ok(extended)
}

/// Split at `fraction` of the bars: `(head, tail)`.
pub fn split_fraction(
    dataset: &OhlcDataset,
    fraction: f64,
) -> Result<(OhlcDataset, OhlcDataset), ArbiterError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ArbiterError::configuration(
            "split_fraction",
            format!("fraction must be in [0, 1], got {fraction}"),
        ));
    }
    let at = (dataset.len() as f64 * fraction).round() as usize;
    Ok((dataset.slice(0..at), dataset.slice(at..dataset.len())))
}

/// Consecutive chunks of `length` bars, oldest first. The last chunk may be
/// shorter.
pub fn sub_ranges(dataset: &OhlcDataset, length: usize) -> Result<Vec<OhlcDataset>, ArbiterError> {
    if length == 0 {
        return Err(ArbiterError::configuration(
            "analysis_length",
            "sub-range length must be positive",
        ));
    }
    Ok((0..dataset.len())
        .step_by(length)
        .map(|start| dataset.slice(start..(start + length).min(dataset.len())))
        .collect())
}
