//! Risk/reward metrics for a directional decision.

use serde::Serialize;

use crate::domain::{Signal, TradeDecision};

/// Reward and risk distances implied by a decision's price levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub reward: f64,
    pub risk: f64,
    /// `reward / risk`; `None` when risk is zero.
    pub ratio: Option<f64>,
}

/// Metrics for `decision`, or `None` when no position is implied
/// (WAIT, or either TP or SL unset).
pub fn compute(decision: &TradeDecision) -> Option<RiskMetrics> {
    if decision.signal() == Signal::Wait || decision.tp_price() == 0.0 || decision.sl_price() == 0.0
    {
        return None;
    }

    let entry = decision.entry_price();
    let reward = (decision.tp_price() - entry).abs();
    let risk = (entry - decision.sl_price()).abs();
    let ratio = if risk > 0.0 {
        Some(reward / risk).filter(|r| r.is_finite())
    } else {
        None
    };

    Some(RiskMetrics {
        reward,
        risk,
        ratio,
    })
}
