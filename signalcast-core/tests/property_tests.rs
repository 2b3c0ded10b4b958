//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. RSI bounds: every defined RSI value lies in [0, 100]
//! 2. EMA recurrence: beyond the seed, EMA[t] = α·close[t] + (1-α)·EMA[t-1]
//! 3. Normalizer totality: any JSON yields a decision honouring price ordering
//! 4. Risk consistency: metrics exist only for directional decisions with both legs

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use signalcast_core::decision::{normalize, normalize_text, DecisionSchema, MAX_REASON_CHARS};
use signalcast_core::domain::{Bar, Signal, TradeDecision};
use signalcast_core::indicators::{ema, Ema, Indicator, Rsi};
use signalcast_core::risk;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..100_000.0_f64, 1..max_len)
}

fn bars_from(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + Duration::hours(4 * i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1.0,
        })
        .collect()
}

/// Values an oracle might plausibly put in a numeric field.
fn arb_field() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6..1.0e6_f64).prop_map(|f| json!(f)),
        (-500_i64..500).prop_map(|i| json!(i)),
        (0.0..200_000.0_f64).prop_map(|f| json!(f.to_string())),
        "[a-zA-Z ]{0,12}".prop_map(Value::String),
    ]
}

fn arb_signal() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!("LONG")),
        Just(json!("SHORT")),
        Just(json!("WAIT")),
        Just(json!("long")),
        Just(json!("BUY")),
        Just(json!(1)),
        Just(Value::Null),
    ]
}

fn arb_record() -> impl Strategy<Value = Value> {
    (
        arb_signal(),
        arb_field(),
        arb_field(),
        arb_field(),
        arb_field(),
        prop::option::of(".{0,300}"),
    )
        .prop_map(|(signal, confidence, entry, tp, sl, reason)| {
            let mut m = Map::new();
            m.insert("signal".into(), signal);
            m.insert("confidence".into(), confidence);
            m.insert("entry_price".into(), entry);
            m.insert("tp_price".into(), tp);
            m.insert("sl_price".into(), sl);
            if let Some(r) = reason {
                m.insert("reason".into(), Value::String(r));
            }
            Value::Object(m)
        })
}

fn assert_invariant(d: &TradeDecision) {
    assert!(d.confidence() <= 100);
    for p in [d.entry_price(), d.tp_price(), d.sl_price()] {
        assert!(p.is_finite() && p >= 0.0, "price {p}");
    }
    assert!(!d.reason().trim().is_empty());
    let (e, tp, sl) = (d.entry_price(), d.tp_price(), d.sl_price());
    match d.signal() {
        Signal::Wait => {
            assert_eq!(tp, 0.0);
            assert_eq!(sl, 0.0);
        }
        Signal::Long => {
            assert!(tp == 0.0 || tp > e, "LONG tp {tp} entry {e}");
            assert!(sl == 0.0 || sl < e, "LONG sl {sl} entry {e}");
        }
        Signal::Short => {
            assert!(tp == 0.0 || tp < e, "SHORT tp {tp} entry {e}");
            assert!(sl == 0.0 || sl > e, "SHORT sl {sl} entry {e}");
        }
    }
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_stays_within_bounds(closes in arb_closes(120)) {
        let values = Rsi::new(14).compute(&bars_from(&closes));
        prop_assert_eq!(values.len(), closes.len());
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(&v), "RSI out of range: {}", v);
        }
    }
}

// ── 2. EMA recurrence ────────────────────────────────────────────────

proptest! {
    #[test]
    fn ema_follows_recurrence(closes in arb_closes(120), period in 2_usize..30) {
        let values = Ema::new(period).compute(&bars_from(&closes));
        let alpha = ema::alpha(period);
        for t in period..closes.len() {
            let expected = alpha * closes[t] + (1.0 - alpha) * values[t - 1];
            prop_assert!(
                (values[t] - expected).abs() <= 1e-9 * expected.abs().max(1.0),
                "t={} got {} expected {}", t, values[t], expected
            );
        }
        for v in values.iter().take(period - 1) {
            prop_assert!(v.is_nan());
        }
    }
}

// ── 3. Normalizer totality ───────────────────────────────────────────

proptest! {
    #[test]
    fn normalizer_output_always_satisfies_invariant(record in arb_record()) {
        let d = normalize(&record, DecisionSchema::Directional);
        assert_invariant(&d);

        let scored = normalize(&record, DecisionSchema::Scored { long_threshold: 75 });
        assert_invariant(&scored);
        prop_assert_eq!(scored.tp_price(), 0.0);
    }

    #[test]
    fn normalizer_never_panics_on_text(raw in ".{0,400}") {
        let d = normalize_text(&raw, DecisionSchema::Directional);
        assert_invariant(&d);
    }

    #[test]
    fn reason_is_bounded(reason in ".{0,600}") {
        let d = normalize(&json!({"signal": "WAIT", "reason": reason}), DecisionSchema::Directional);
        prop_assert!(d.reason().chars().count() <= MAX_REASON_CHARS);
    }
}

// ── 4. Risk consistency ──────────────────────────────────────────────

proptest! {
    #[test]
    fn risk_defined_only_with_both_legs(record in arb_record()) {
        let d = normalize(&record, DecisionSchema::Directional);
        match risk::compute(&d) {
            None => prop_assert!(
                d.signal() == Signal::Wait || d.tp_price() == 0.0 || d.sl_price() == 0.0
            ),
            Some(m) => {
                prop_assert!(d.signal() != Signal::Wait);
                prop_assert!(m.reward > 0.0 && m.risk > 0.0);
                if let Some(r) = m.ratio {
                    prop_assert!(r.is_finite() && r > 0.0);
                }
            }
        }
    }
}
