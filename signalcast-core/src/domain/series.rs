//! PriceSeries: validated, timestamp-ordered bar history for one symbol.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::bar::Bar;

/// Reasons a bar sequence cannot become a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} at {timestamp} is earlier than the bar before it")]
    OutOfOrder {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    #[error("duplicate bar timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: DateTime<Utc> },
}

/// Bars ordered by timestamp ascending with no duplicate timestamps.
///
/// The ordering invariant is checked once at construction; every consumer
/// downstream (indicators, snapshot builder) relies on it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.timestamp == prev.timestamp {
                return Err(SeriesError::DuplicateTimestamp {
                    timestamp: curr.timestamp,
                });
            }
            if curr.timestamp < prev.timestamp {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    timestamp: curr.timestamp,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Sort by timestamp and drop later duplicates before validating.
    ///
    /// Used by importers whose source files are not guaranteed to be ordered.
    pub fn from_unsorted(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Keep only the trailing `n` bars.
    pub fn tail(mut self, n: usize) -> Self {
        if self.bars.len() > n {
            let excess = self.bars.len() - n;
            self.bars.drain(..excess);
        }
        self
    }

    /// BLAKE3 digest over every bar's timestamp and OHLCV bit patterns.
    ///
    /// Identifies the exact data a run was computed from in log output.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
