//! Indicator engine: latest-bar values for the fixed indicator set.
//!
//! Every call recomputes each indicator over the full series. Nothing is
//! cached between runs.

use serde::{Deserialize, Serialize};

use super::{Atr, Ema, Indicator, Macd, Rsi};
use crate::domain::{Bar, PriceSeries};

/// Largest lookback in the set (EMA50). A series needs `MAX_LOOKBACK + 1`
/// bars for every value to be defined.
pub const MAX_LOOKBACK: usize = 49;

/// Latest value of each indicator. `None` means undefined (not enough history).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    #[serde(rename = "RSI14")]
    pub rsi14: Option<f64>,
    #[serde(rename = "EMA20")]
    pub ema20: Option<f64>,
    #[serde(rename = "EMA50")]
    pub ema50: Option<f64>,
    #[serde(rename = "ATR14")]
    pub atr14: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "MACD_SIGNAL")]
    pub macd_signal: Option<f64>,
}

impl IndicatorSet {
    /// Canonical `(name, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("RSI14", self.rsi14),
            ("EMA20", self.ema20),
            ("EMA50", self.ema50),
            ("ATR14", self.atr14),
            ("MACD", self.macd),
            ("MACD_SIGNAL", self.macd_signal),
        ]
    }

    /// Number of indicators with a defined value.
    pub fn defined_count(&self) -> usize {
        self.entries().iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Compute the indicator set for the most recent bar of `series`.
pub fn compute(series: &PriceSeries) -> IndicatorSet {
    let bars = series.bars();
    IndicatorSet {
        rsi14: latest(&Rsi::new(14), bars),
        ema20: latest(&Ema::new(20), bars),
        ema50: latest(&Ema::new(50), bars),
        atr14: latest(&Atr::new(14), bars),
        macd: latest(&Macd::standard_line(), bars),
        macd_signal: latest(&Macd::standard_signal(), bars),
    }
}

/// Latest value of one indicator; NaN and infinities become undefined.
fn latest(indicator: &dyn Indicator, bars: &[Bar]) -> Option<f64> {
    if bars.len() < indicator.lookback() + 1 {
        return None;
    }
    indicator
        .compute(bars)
        .last()
        .copied()
        .filter(|v| v.is_finite())
}
