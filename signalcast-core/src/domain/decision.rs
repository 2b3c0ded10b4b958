//! Canonical trade decision produced by the decision normalizer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Long,
    Short,
    Wait,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Wait => "WAIT",
        }
    }

    /// Case-sensitive parse of the canonical wire names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LONG" => Some(Signal::Long),
            "SHORT" => Some(Signal::Short),
            "WAIT" => Some(Signal::Wait),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason attached to the safe default decision.
pub const UNAVAILABLE_REASON: &str = "decision source unavailable";

/// A validated trade recommendation.
///
/// Fields are private: the only ways to obtain a `TradeDecision` are
/// [`TradeDecision::safe_default`] and the decision normalizer, so every
/// instance satisfies the price-ordering invariant:
/// - `Wait` carries `tp_price == sl_price == 0`
/// - `Long` carries `tp_price > entry_price > sl_price` for the legs that are set
/// - `Short` carries `sl_price > entry_price > tp_price` for the legs that are set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeDecision {
    signal: Signal,
    confidence: u8,
    entry_price: f64,
    tp_price: f64,
    sl_price: f64,
    reason: String,
}

impl TradeDecision {
    /// Inert recommendation used whenever the decision source fails.
    pub fn safe_default() -> Self {
        Self {
            signal: Signal::Wait,
            confidence: 0,
            entry_price: 0.0,
            tp_price: 0.0,
            sl_price: 0.0,
            reason: UNAVAILABLE_REASON.to_string(),
        }
    }

    /// Assemble a decision whose fields the caller has already validated.
    pub(crate) fn from_validated(
        signal: Signal,
        confidence: u8,
        entry_price: f64,
        tp_price: f64,
        sl_price: f64,
        reason: String,
    ) -> Self {
        debug_assert!(confidence <= 100);
        Self {
            signal,
            confidence,
            entry_price,
            tp_price,
            sl_price,
            reason,
        }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    /// Confidence score in `[0, 100]`.
    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn tp_price(&self) -> f64 {
        self.tp_price
    }

    pub fn sl_price(&self) -> f64 {
        self.sl_price
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// True for LONG and SHORT.
    pub fn is_directional(&self) -> bool {
        self.signal != Signal::Wait
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_parse_is_case_sensitive() {
        assert_eq!(Signal::parse("LONG"), Some(Signal::Long));
        assert_eq!(Signal::parse("SHORT"), Some(Signal::Short));
        assert_eq!(Signal::parse("WAIT"), Some(Signal::Wait));
        assert_eq!(Signal::parse("long"), None);
        assert_eq!(Signal::parse("BUY"), None);
    }

    #[test]
    fn safe_default_is_inert() {
        let d = TradeDecision::safe_default();
        assert_eq!(d.signal(), Signal::Wait);
        assert_eq!(d.confidence(), 0);
        assert_eq!(d.entry_price(), 0.0);
        assert_eq!(d.tp_price(), 0.0);
        assert_eq!(d.sl_price(), 0.0);
        assert_eq!(d.reason(), "decision source unavailable");
        assert!(!d.is_directional());
    }

    #[test]
    fn signal_serializes_with_wire_names() {
        assert_eq!(serde_json::to_string(&Signal::Short).unwrap(), "\"SHORT\"");
        let d = TradeDecision::safe_default();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["signal"], "WAIT");
        assert_eq!(json["confidence"], 0);
    }
}
