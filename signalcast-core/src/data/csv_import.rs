//! CSV import provider for offline runs.
//!
//! Expected header: `timestamp,open,high,low,close,volume`. Timestamps are
//! RFC 3339 strings or epoch milliseconds. Rows are sorted and de-duplicated
//! by timestamp on import; the trailing `limit` rows are returned. A row with
//! a non-finite or inconsistent OHLCV value fails the whole import.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataProvider};
use crate::domain::{Bar, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads bars from a single CSV file. The symbol argument to `fetch` is only
/// used for error messages.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bars(&self) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::Io(format!("{}: {e}", self.path.display())))?;

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| DataError::Csv(format!("row {}: {e}", i + 1)))?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                DataError::Csv(format!("row {}: invalid timestamp '{}'", i + 1, row.timestamp))
            })?;
            let bar = Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if !bar.is_sane() {
                return Err(DataError::Csv(format!(
                    "row {}: invalid OHLCV values ({}, {}, {}, {}, {})",
                    i + 1,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                )));
            }
            bars.push(bar);
        }
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, _timeframe: &str, limit: usize) -> Result<PriceSeries, DataError> {
        let series = PriceSeries::from_unsorted(self.read_bars()?).tail(limit);
        if series.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(series)
    }
}
