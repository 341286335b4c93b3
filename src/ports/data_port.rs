//! Market data access port.

use crate::domain::error::ArbiterError;
use crate::domain::ohlcv::OhlcDataset;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` dated inside `[start, end]`, oldest first.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<OhlcDataset, ArbiterError>;

    fn list_symbols(&self) -> Result<Vec<String>, ArbiterError>;
}
