//! CSV market data and forecast files.
//!
//! OHLC files carry a header with `date,open,high,low,close,volume` and an
//! optional `adj_close` column, in any order. Forecast files carry one value
//! per row in their last column.

use crate::domain::error::ArbiterError;
use crate::domain::ohlcv::{OhlcDataset, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of `<SYMBOL>.csv` files.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcDataset, ArbiterError> {
        let mut dataset = read_ohlcv_file(self.csv_path(symbol), symbol)?;
        dataset
            .bars
            .retain(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e));
        Ok(dataset)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ArbiterError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ArbiterError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArbiterError::Data {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ArbiterError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };
        let require = |name: &str| {
            find(&[name]).ok_or_else(|| ArbiterError::Data {
                reason: format!("missing {name} column"),
            })
        };
        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            adj_close: find(&["adj_close", "adj close", "adjusted_close"]),
            volume: require("volume")?,
        })
    }
}

/// Read one OHLC file as the dataset for `symbol`, sorted by date.
pub fn read_ohlcv_file(path: impl AsRef<Path>, symbol: &str) -> Result<OhlcDataset, ArbiterError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ArbiterError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse_ohlcv(&content, symbol)
}

pub fn parse_ohlcv(content: &str, symbol: &str) -> Result<OhlcDataset, ArbiterError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().map_err(csv_error)?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let field = |index: usize, name: &str| {
            record
                .get(index)
                .map(str::trim)
                .ok_or_else(|| ArbiterError::Data {
                    reason: format!("missing {name} value"),
                })
        };

        let date_str = field(columns.date, "date")?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            ArbiterError::Data {
                reason: format!("invalid date '{date_str}': {e}"),
            }
        })?;
        let adj_close = match columns.adj_close.and_then(|i| record.get(i)).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_number(raw, "adj_close")?),
        };

        bars.push(OhlcvBar {
            date,
            open: parse_number(field(columns.open, "open")?, "open")?,
            high: parse_number(field(columns.high, "high")?, "high")?,
            low: parse_number(field(columns.low, "low")?, "low")?,
            close: parse_number(field(columns.close, "close")?, "close")?,
            adj_close,
            volume: parse_volume(field(columns.volume, "volume")?)?,
        });
    }

    bars.sort_by_key(|b| b.date);
    OhlcDataset::new(symbol, bars)
}

/// Read a forecast file: the last column of every row, in file order.
pub fn read_forecast_file(path: impl AsRef<Path>) -> Result<Vec<f64>, ArbiterError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ArbiterError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse_forecast(&content)
}

pub fn parse_forecast(content: &str) -> Result<Vec<f64>, ArbiterError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.records()
        .map(|result| {
            let record = result.map_err(csv_error)?;
            let raw = record.iter().last().ok_or_else(|| ArbiterError::Data {
                reason: "empty forecast row".into(),
            })?;
            parse_number(raw.trim(), "forecast")
        })
        .collect()
}

fn parse_number(raw: &str, name: &str) -> Result<f64, ArbiterError> {
    raw.parse().map_err(|e| ArbiterError::Data {
        reason: format!("invalid {name} value '{raw}': {e}"),
    })
}

fn parse_volume(raw: &str) -> Result<i64, ArbiterError> {
    match raw.parse::<i64>() {
        Ok(v) => Ok(v),
        Err(_) => parse_number(raw, "volume").map(|v| v.round() as i64),
    }
}

fn csv_error(e: csv::Error) -> ArbiterError {
    ArbiterError::Data {
        reason: format!("CSV parse error: {e}"),
    }
}
