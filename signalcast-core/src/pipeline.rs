//! End-to-end signal pipeline for one symbol.
//!
//! Stages run strictly in order: fetch → snapshot → prompt → oracle →
//! normalize → risk → render → deliver. Only data problems halt a run.
//! Oracle failures degrade to the safe default decision and delivery
//! failures are logged and recorded in the report.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::data::{DataError, DataProvider};
use crate::decision;
use crate::domain::{PriceSeries, TradeDecision};
use crate::notify::{self, NotificationPayload, Notifier};
use crate::oracle::{self, DecisionOracle};
use crate::risk::{self, RiskMetrics};
use crate::snapshot::{self, MarketSnapshot, SnapshotError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SignalReport {
    pub symbol: String,
    pub snapshot: MarketSnapshot,
    pub decision: TradeDecision,
    pub metrics: Option<RiskMetrics>,
    pub payload: NotificationPayload,
    /// BLAKE3 of the input series.
    pub dataset_hash: String,
    /// False until a notifier accepted the payload.
    pub delivered: bool,
}

/// Produce a decision and its notification from an already-fetched series.
///
/// The payload depends only on the series, the oracle's reply and the
/// config, so identical inputs give identical payloads.
pub fn generate(
    symbol: &str,
    series: &PriceSeries,
    oracle: &dyn DecisionOracle,
    config: &PipelineConfig,
) -> Result<SignalReport, PipelineError> {
    let snapshot = snapshot::build(symbol, series)?;
    info!(
        symbol,
        bars = series.len(),
        price = snapshot.current_price(),
        indicators = snapshot.indicators().defined_count(),
        "snapshot built"
    );

    let schema = config.schema();
    let prompt = oracle::build_prompt(&snapshot, schema);
    debug!(symbol, %prompt, "prompt");

    let decision = match oracle::ask_with_retry(oracle, &prompt, config.retry_policy()) {
        Ok(raw) => {
            debug!(symbol, %raw, "oracle response");
            decision::normalize_text(&raw, schema)
        }
        Err(e) => {
            warn!(symbol, oracle = oracle.name(), error = %e, "oracle unavailable; using safe default");
            TradeDecision::safe_default()
        }
    };
    info!(
        symbol,
        signal = %decision.signal(),
        confidence = decision.confidence(),
        "decision normalized"
    );

    let metrics = risk::compute(&decision);
    let payload = notify::render(
        &decision,
        metrics.as_ref(),
        symbol,
        snapshot.current_price(),
        snapshot.as_of(),
        config.footer(),
    );

    Ok(SignalReport {
        symbol: symbol.to_string(),
        dataset_hash: series.dataset_hash(),
        snapshot,
        decision,
        metrics,
        payload,
        delivered: false,
    })
}

/// Fetch, generate, and deliver one notification for `symbol`.
pub fn run(
    symbol: &str,
    provider: &dyn DataProvider,
    oracle: &dyn DecisionOracle,
    notifier: &dyn Notifier,
    config: &PipelineConfig,
) -> Result<SignalReport, PipelineError> {
    let series = provider.fetch(symbol, &config.pipeline.timeframe, config.pipeline.limit)?;
    info!(symbol, provider = provider.name(), bars = series.len(), "series fetched");
    let malformed = series.bars().iter().filter(|b| !b.is_sane()).count();
    if malformed > 0 {
        warn!(symbol, malformed, "series contains bars failing OHLC sanity checks");
    }

    let mut report = generate(symbol, &series, oracle, config)?;

    match notifier.deliver(&report.payload) {
        Ok(()) => {
            info!(symbol, notifier = notifier.name(), "notification delivered");
            report.delivered = true;
        }
        Err(e) => {
            warn!(symbol, notifier = notifier.name(), error = %e, "notification delivery failed");
        }
    }
    Ok(report)
}
