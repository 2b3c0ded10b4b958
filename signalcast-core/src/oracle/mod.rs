//! Decision oracle boundary.
//!
//! An oracle turns a prompt into raw text. Nothing it returns is trusted:
//! the text goes straight to the decision normalizer, and an error is treated
//! as an absent response.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiOracle;
pub use prompt::build_prompt;

use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle returned no text")]
    EmptyResponse,

    #[error("oracle misconfigured: {0}")]
    Config(String),
}

/// Remote service producing a raw recommendation for a prompt.
pub trait DecisionOracle: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw reply text.
    fn ask(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Returns the same canned reply for every prompt.
///
/// Backs offline runs (`--response <file>`) and deterministic tests.
#[derive(Debug, Clone)]
pub struct ReplayOracle {
    response: String,
}

impl ReplayOracle {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl DecisionOracle for ReplayOracle {
    fn name(&self) -> &str {
        "replay"
    }

    fn ask(&self, _prompt: &str) -> Result<String, OracleError> {
        Ok(self.response.clone())
    }
}

/// Bounded retry around a single oracle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; capped at 1.
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(2),
        }
    }
}

/// Ask `oracle`, retrying at most once on failure.
pub fn ask_with_retry(
    oracle: &dyn DecisionOracle,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<String, OracleError> {
    let attempts = 1 + policy.max_retries.min(1);
    let mut attempt = 1;
    loop {
        match oracle.ask(prompt) {
            Ok(text) => return Ok(text),
            Err(e) if attempt < attempts => {
                warn!(oracle = oracle.name(), attempt, error = %e, "oracle call failed; retrying");
                std::thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(e) => {
                warn!(oracle = oracle.name(), attempt, error = %e, "oracle call failed");
                return Err(e);
            }
        }
    }
}
