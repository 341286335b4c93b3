#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use signalarb::domain::error::ArbiterError;
pub use signalarb::domain::ohlcv::{OhlcDataset, OhlcvBar};
use signalarb::ports::data_port::DataPort;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcDataset, ArbiterError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ArbiterError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
            .collect();
        OhlcDataset::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ArbiterError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive weekdays starting at `start`.
pub fn weekdays(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut current = start;
    while dates.len() < n {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current += Duration::days(1);
    }
    dates
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        adj_close: None,
        volume: 10_000,
    }
}

/// Weekday bars from Monday 2024-01-01 with the given closes.
pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    weekdays(date(2024, 1, 1), closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| make_bar(d, c))
        .collect()
}

pub fn make_dataset(symbol: &str, closes: &[f64]) -> OhlcDataset {
    OhlcDataset::new(symbol, make_bars(closes)).unwrap()
}

/// Oscillating closes around 100.
pub fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin())
        .collect()
}

pub fn write_ohlcv_csv(path: &Path, bars: &[OhlcvBar]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "date,open,high,low,close,adj_close,volume").unwrap();
    for b in bars {
        let adj = b.adj_close.map(|v| v.to_string()).unwrap_or_default();
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, adj, b.volume
        )
        .unwrap();
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
