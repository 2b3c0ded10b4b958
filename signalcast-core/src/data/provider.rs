//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over market-data sources (exchange REST,
//! CSV import) so the pipeline can swap implementations and tests can mock.

use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Structured error types for data operations.
///
/// Designed to be displayable in CLI output and log lines alike.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("unsupported timeframe '{0}'")]
    UnsupportedTimeframe(String),

    #[error("insufficient data: provider returned no bars for '{symbol}'")]
    NoData { symbol: String },

    #[error("invalid price series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of OHLCV history for one symbol.
///
/// An empty result is never returned as `Ok`: implementations report it as
/// [`DataError::NoData`].
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the trailing `limit` bars of `timeframe` (e.g. "4h") for `symbol`.
    fn fetch(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<PriceSeries, DataError>;
}
