//! SignalCast Core: indicators, market snapshot, decision normalization, risk, notification.
//!
//! This crate contains the whole signal pipeline:
//! - Domain types (bars, price series, trade decisions)
//! - Indicator engine (RSI, EMA, ATR, MACD) with explicit warm-up
//! - Market snapshot builder and oracle prompt
//! - Decision normalizer enforcing the price-ordering invariant
//! - Risk/reward calculator and HTML notification formatter
//! - Adapters for market data, decision oracles, and push transports

pub mod config;
pub mod data;
pub mod decision;
pub mod domain;
pub mod indicators;
pub mod notify;
pub mod oracle;
pub mod pipeline;
pub mod risk;
pub mod snapshot;
