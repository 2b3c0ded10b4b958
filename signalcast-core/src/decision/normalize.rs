//! Raw oracle response → canonical [`TradeDecision`].
//!
//! Nothing here returns an error. Malformed input degrades to the inert safe
//! default (WAIT, confidence 0); an internally inconsistent TP/SL pair is
//! forced to WAIT with confidence 0 and a note appended to the reason.

use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

use super::DecisionSchema;
use crate::domain::{Signal, TradeDecision};

/// Upper bound on the reason text, in characters.
pub const MAX_REASON_CHARS: usize = 200;

/// Reason used when the response carries none.
pub const MISSING_REASON: &str = "no reason provided";

/// Why a directional decision's price levels were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderingViolation {
    MissingEntry,
    TakeProfitWrongSide,
    StopLossWrongSide,
}

impl fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            OrderingViolation::MissingEntry => "TP/SL given without an entry price",
            OrderingViolation::TakeProfitWrongSide => "take-profit on the wrong side of entry",
            OrderingViolation::StopLossWrongSide => "stop-loss on the wrong side of entry",
        };
        f.write_str(msg)
    }
}

/// Normalize raw response text.
///
/// Markdown code fences and any prose around the outermost JSON object are
/// stripped before parsing. Unparseable text yields the safe default.
pub fn normalize_text(raw: &str, schema: DecisionSchema) -> TradeDecision {
    match extract_json(raw) {
        Some(value) => normalize(&value, schema),
        None => {
            warn!(len = raw.len(), "oracle response is not JSON; using safe default");
            TradeDecision::safe_default()
        }
    }
}

/// Parse the JSON payload out of an LLM reply.
pub fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = raw
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return Some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&cleaned[start..=end]).ok()
}

/// Normalize an already-parsed response.
pub fn normalize(raw: &Value, schema: DecisionSchema) -> TradeDecision {
    let Some(record) = raw.as_object() else {
        warn!("oracle response is not a JSON object; using safe default");
        return TradeDecision::safe_default();
    };

    let confidence = read_confidence(record);
    let reason = read_reason(record);

    match schema {
        DecisionSchema::Scored { long_threshold } => {
            // Zero confidence is also what an unusable score coerces to.
            let signal = if confidence > 0 && confidence >= long_threshold {
                Signal::Long
            } else {
                Signal::Wait
            };
            TradeDecision::from_validated(signal, confidence, 0.0, 0.0, 0.0, reason)
        }
        DecisionSchema::Directional => normalize_directional(record, confidence, reason),
    }
}

fn normalize_directional(
    record: &Map<String, Value>,
    confidence: u8,
    reason: String,
) -> TradeDecision {
    let signal = match record.get("signal") {
        Some(Value::String(s)) => Signal::parse(s).unwrap_or_else(|| {
            debug!(signal = %s, "unrecognised signal; coercing to WAIT");
            Signal::Wait
        }),
        _ => Signal::Wait,
    };

    let entry = read_price(record, "entry_price");
    let tp = read_price(record, "tp_price");
    let sl = read_price(record, "sl_price");

    if signal == Signal::Wait {
        return TradeDecision::from_validated(Signal::Wait, confidence, entry, 0.0, 0.0, reason);
    }

    match check_ordering(signal, entry, tp, sl) {
        Ok(()) => TradeDecision::from_validated(signal, confidence, entry, tp, sl, reason),
        Err(violation) => {
            warn!(
                %signal,
                entry,
                tp,
                sl,
                %violation,
                "inconsistent risk parameters; forcing WAIT"
            );
            let reason = format!("{reason} [inconsistent {signal} decision: {violation}; forced WAIT]");
            TradeDecision::from_validated(Signal::Wait, 0, entry, 0.0, 0.0, reason)
        }
    }
}

/// Each price level that is set must sit on the correct side of entry:
/// LONG wants `tp > entry > sl`, SHORT wants `sl > entry > tp`.
/// Unset levels (0) are not checked, but a set level needs an entry.
fn check_ordering(signal: Signal, entry: f64, tp: f64, sl: f64) -> Result<(), OrderingViolation> {
    if tp == 0.0 && sl == 0.0 {
        return Ok(());
    }
    if entry == 0.0 {
        return Err(OrderingViolation::MissingEntry);
    }

    let (tp_ok, sl_ok) = match signal {
        Signal::Long => (tp == 0.0 || tp > entry, sl == 0.0 || sl < entry),
        Signal::Short => (tp == 0.0 || tp < entry, sl == 0.0 || sl > entry),
        Signal::Wait => (true, true),
    };

    if !tp_ok {
        Err(OrderingViolation::TakeProfitWrongSide)
    } else if !sl_ok {
        Err(OrderingViolation::StopLossWrongSide)
    } else {
        Ok(())
    }
}

/// Finite number, or a string holding one.
fn read_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn read_confidence(record: &Map<String, Value>) -> u8 {
    read_number(record.get("confidence"))
        .map(|c| c.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

fn read_price(record: &Map<String, Value>, key: &str) -> f64 {
    read_number(record.get(key))
        .filter(|p| *p >= 0.0)
        .unwrap_or(0.0)
}

fn read_reason(record: &Map<String, Value>) -> String {
    match record.get("reason") {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            s.trim().chars().take(MAX_REASON_CHARS).collect()
        }
        _ => MISSING_REASON.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIRECTIONAL: DecisionSchema = DecisionSchema::Directional;

    #[test]
    fn clamp_and_inverted_levels_both_apply() {
        let raw = json!({
            "signal": "LONG",
            "confidence": 150,
            "entry_price": 100,
            "tp_price": 90,
            "sl_price": 110,
            "reason": "x"
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Wait);
        assert_eq!(d.confidence(), 0);
        assert_eq!(d.tp_price(), 0.0);
        assert_eq!(d.sl_price(), 0.0);
        assert!(d.reason().starts_with("x ["));
        assert!(d.reason().contains("forced WAIT"));
    }

    #[test]
    fn unparseable_text_is_exact_safe_default() {
        let d = normalize_text("the model is overloaded, try later", DIRECTIONAL);
        assert_eq!(d, TradeDecision::safe_default());
        assert_eq!(d.reason(), "decision source unavailable");
    }

    #[test]
    fn non_object_json_is_safe_default() {
        assert_eq!(normalize(&json!([1, 2, 3]), DIRECTIONAL), TradeDecision::safe_default());
        assert_eq!(normalize(&json!("LONG"), DIRECTIONAL), TradeDecision::safe_default());
        assert_eq!(normalize(&Value::Null, DIRECTIONAL), TradeDecision::safe_default());
    }

    #[test]
    fn valid_long_passes_through() {
        let raw = json!({
            "signal": "LONG",
            "confidence": 72,
            "entry_price": 100.0,
            "tp_price": 110.0,
            "sl_price": 95.0,
            "reason": "EMA20 above EMA50"
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Long);
        assert_eq!(d.confidence(), 72);
        assert_eq!((d.entry_price(), d.tp_price(), d.sl_price()), (100.0, 110.0, 95.0));
        assert_eq!(d.reason(), "EMA20 above EMA50");
    }

    #[test]
    fn valid_short_passes_through() {
        let raw = json!({
            "signal": "SHORT",
            "confidence": 64.6,
            "entry_price": 100,
            "tp_price": 88,
            "sl_price": 104,
            "reason": "lower highs"
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Short);
        assert_eq!(d.confidence(), 65);
        assert_eq!((d.tp_price(), d.sl_price()), (88.0, 104.0));
    }

    #[test]
    fn short_with_long_style_levels_is_forced_to_wait() {
        let raw = json!({
            "signal": "SHORT",
            "confidence": 80,
            "entry_price": 100,
            "tp_price": 110,
            "sl_price": 95,
            "reason": "r"
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Wait);
        assert_eq!(d.confidence(), 0);
    }

    #[test]
    fn single_leg_on_wrong_side_is_rejected() {
        let raw = json!({"signal": "LONG", "confidence": 60, "entry_price": 100, "tp_price": 90});
        assert_eq!(normalize(&raw, DIRECTIONAL).signal(), Signal::Wait);
    }

    #[test]
    fn levels_without_entry_are_rejected() {
        let raw = json!({"signal": "LONG", "confidence": 60, "tp_price": 110, "sl_price": 90});
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Wait);
        assert!(d.reason().contains("without an entry price"));
    }

    #[test]
    fn directional_without_levels_is_kept() {
        let raw = json!({"signal": "LONG", "confidence": 55, "reason": "breakout"});
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Long);
        assert_eq!(d.confidence(), 55);
    }

    #[test]
    fn wait_zeroes_levels_and_keeps_confidence() {
        let raw = json!({
            "signal": "WAIT",
            "confidence": 40,
            "entry_price": 100,
            "tp_price": 120,
            "sl_price": 90,
            "reason": "range"
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Wait);
        assert_eq!(d.confidence(), 40);
        assert_eq!((d.tp_price(), d.sl_price()), (0.0, 0.0));
    }

    #[test]
    fn unknown_or_lowercase_signal_becomes_wait() {
        for s in [json!("BUY"), json!("long"), json!(1), Value::Null] {
            let raw = json!({"signal": s, "confidence": 90, "entry_price": 100, "tp_price": 110, "sl_price": 95});
            let d = normalize(&raw, DIRECTIONAL);
            assert_eq!(d.signal(), Signal::Wait);
            assert_eq!(d.tp_price(), 0.0);
        }
    }

    #[test]
    fn non_numeric_fields_become_zero() {
        let raw = json!({
            "signal": "LONG",
            "confidence": "very high",
            "entry_price": {"value": 3},
            "tp_price": null,
            "sl_price": true
        });
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Long);
        assert_eq!(d.confidence(), 0);
        assert_eq!((d.entry_price(), d.tp_price(), d.sl_price()), (0.0, 0.0, 0.0));
        assert_eq!(d.reason(), MISSING_REASON);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let raw = json!({"signal": "LONG", "confidence": " 75 ", "entry_price": "100.5", "tp_price": "110", "sl_price": "99"});
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.confidence(), 75);
        assert_eq!(d.entry_price(), 100.5);
        assert_eq!(d.signal(), Signal::Long);
    }

    #[test]
    fn negative_values_are_rejected() {
        let raw = json!({"signal": "WAIT", "confidence": -20, "entry_price": -5});
        let d = normalize(&raw, DIRECTIONAL);
        assert_eq!(d.confidence(), 0);
        assert_eq!(d.entry_price(), 0.0);
    }

    #[test]
    fn reason_is_truncated_by_characters() {
        let long: String = "涨".repeat(500);
        let d = normalize(&json!({"reason": long}), DIRECTIONAL);
        assert_eq!(d.reason().chars().count(), MAX_REASON_CHARS);
    }

    #[test]
    fn blank_reason_is_missing() {
        let d = normalize(&json!({"reason": "   "}), DIRECTIONAL);
        assert_eq!(d.reason(), MISSING_REASON);
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"signal\": \"WAIT\", \"confidence\": 30, \"reason\": \"chop\"}\n```";
        let d = normalize_text(raw, DIRECTIONAL);
        assert_eq!(d.confidence(), 30);
        assert_eq!(d.reason(), "chop");
    }

    #[test]
    fn json_embedded_in_prose_is_accepted() {
        let raw = "Here is my analysis: {\"signal\": \"LONG\", \"confidence\": 70} Good luck!";
        let d = normalize_text(raw, DIRECTIONAL);
        assert_eq!(d.signal(), Signal::Long);
        assert_eq!(d.confidence(), 70);
    }

    #[test]
    fn scored_schema_derives_signal_from_threshold() {
        let schema = DecisionSchema::Scored { long_threshold: 75 };
        let hi = normalize(&json!({"confidence": 80, "reason": "RSI rebound"}), schema);
        assert_eq!(hi.signal(), Signal::Long);
        assert_eq!(hi.confidence(), 80);
        assert_eq!(hi.tp_price(), 0.0);

        let edge = normalize(&json!({"confidence": 75}), schema);
        assert_eq!(edge.signal(), Signal::Long);

        let lo = normalize(&json!({"confidence": 20, "signal": "SHORT", "tp_price": 5}), schema);
        assert_eq!(lo.signal(), Signal::Wait);
        assert_eq!(lo.tp_price(), 0.0);
    }

    #[test]
    fn scored_schema_never_goes_long_without_confidence() {
        let schema = DecisionSchema::Scored { long_threshold: 0 };
        for raw in [json!({"confidence": "high"}), json!({"reason": "no score"}), json!({"confidence": 0})] {
            let d = normalize(&raw, schema);
            assert_eq!(d.signal(), Signal::Wait, "{raw}");
            assert_eq!(d.confidence(), 0);
        }
        assert_eq!(normalize(&json!({"confidence": 1}), schema).signal(), Signal::Long);
    }
}
