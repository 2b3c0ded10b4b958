//! Market snapshot builder.
//!
//! A snapshot is the single unit handed to the decision oracle: symbol,
//! latest close, the indicator set, and the latest bar's timestamp.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

use crate::domain::PriceSeries;
use crate::indicators::{self, IndicatorSet};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("insufficient data for '{symbol}': price series is empty")]
    InsufficientData { symbol: String },

    #[error("latest close for '{symbol}' is not a positive finite price: {price}")]
    InvalidPrice { symbol: String, price: f64 },
}

/// Immutable market state for one symbol at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    symbol: String,
    current_price: f64,
    indicators: IndicatorSet,
    as_of: DateTime<Utc>,
}

/// Build a snapshot from the latest bar of `series`.
///
/// Undefined indicators are passed through. An empty series or a latest
/// close that is not a positive finite number fails.
pub fn build(symbol: &str, series: &PriceSeries) -> Result<MarketSnapshot, SnapshotError> {
    let latest = series.latest().ok_or_else(|| SnapshotError::InsufficientData {
        symbol: symbol.to_string(),
    })?;
    if !(latest.close.is_finite() && latest.close > 0.0) {
        return Err(SnapshotError::InvalidPrice {
            symbol: symbol.to_string(),
            price: latest.close,
        });
    }

    Ok(MarketSnapshot {
        symbol: symbol.to_string(),
        current_price: latest.close,
        indicators: indicators::compute(series),
        as_of: latest.timestamp,
    })
}

impl MarketSnapshot {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Line-oriented summary for the decision oracle.
    ///
    /// Undefined indicators render as `n/a` so the oracle sees their absence.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Symbol: {}", self.symbol);
        let _ = writeln!(
            out,
            "As of: {}",
            self.as_of.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        let _ = writeln!(out, "Price: {}", self.current_price);
        for (name, value) in self.indicators.entries() {
            match value {
                Some(v) => {
                    let _ = writeln!(out, "{name}: {v:.2}");
                }
                None => {
                    let _ = writeln!(out, "{name}: n/a");
                }
            }
        }
        out
    }
}
