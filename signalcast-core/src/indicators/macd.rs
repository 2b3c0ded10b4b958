//! Moving Average Convergence Divergence (MACD).
//!
//! Two lines (separate Indicator instances):
//! - Macd: EMA(close, fast) - EMA(close, slow). Lookback: slow - 1.
//! - Signal: EMA(macd_line, signal), seeded from the first `signal` defined
//!   MACD values. Lookback: slow - 1 + signal - 1.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        let prefix = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{prefix}_{fast}_{slow}_{signal}"),
        }
    }

    /// The MACD line with the conventional 12/26/9 parameters.
    pub fn standard_line() -> Self {
        Self::new(12, 26, 9, MacdLine::Macd)
    }

    /// The signal line with the conventional 12/26/9 parameters.
    pub fn standard_signal() -> Self {
        Self::new(12, 26, 9, MacdLine::Signal)
    }

    fn macd_line(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }

    fn signal_line(&self, line: &[f64]) -> Vec<f64> {
        let offset = self.slow - 1;
        let mut result = vec![f64::NAN; line.len()];
        if line.len() <= offset {
            return result;
        }
        let smoothed = ema_of_series(&line[offset..], self.signal);
        result[offset..].copy_from_slice(&smoothed);
        result
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal => self.slow - 1 + self.signal - 1,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let line = self.macd_line(&closes);
        match self.line {
            MacdLine::Macd => line,
            MacdLine::Signal => self.signal_line(&line),
        }
    }
}
