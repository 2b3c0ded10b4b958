//! Decision normalization: the trust boundary between the decision oracle's
//! untyped output and the rest of the pipeline.

pub mod normalize;

pub use normalize::{extract_json, normalize, normalize_text, MAX_REASON_CHARS, MISSING_REASON};

use serde::{Deserialize, Serialize};

/// Which response shape the oracle was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionSchema {
    /// `{signal, confidence, entry_price, tp_price, sl_price, reason}` with
    /// LONG/SHORT/WAIT and risk parameters.
    #[default]
    Directional,
    /// Legacy `{confidence, reason}`: LONG when confidence reaches
    /// `long_threshold`, WAIT otherwise. No short selling, no price levels.
    Scored { long_threshold: u8 },
}

impl DecisionSchema {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionSchema::Directional => "directional",
            DecisionSchema::Scored { .. } => "scored",
        }
    }
}
