//! Prompt text for the decision oracle.

use crate::decision::{DecisionSchema, MAX_REASON_CHARS};
use crate::snapshot::MarketSnapshot;

/// Instructions + rendered snapshot + the exact JSON shape to reply with.
pub fn build_prompt(snapshot: &MarketSnapshot, schema: DecisionSchema) -> String {
    let data = snapshot.render();
    match schema {
        DecisionSchema::Directional => format!(
            "You are a professional cryptocurrency quantitative analyst. \
             Using only the market snapshot below, decide whether to open a LONG position, \
             open a SHORT position, or WAIT.\n\
             \n\
             {data}\n\
             Indicators marked n/a have insufficient history; do not guess their values.\n\
             \n\
             Rules:\n\
             - signal is exactly one of LONG, SHORT, WAIT.\n\
             - confidence is an integer from 0 to 100.\n\
             - LONG requires tp_price > entry_price > sl_price.\n\
             - SHORT requires sl_price > entry_price > tp_price.\n\
             - WAIT sets entry_price, tp_price and sl_price to 0.\n\
             - reason is at most {MAX_REASON_CHARS} characters.\n\
             \n\
             Reply with pure JSON only, in exactly this shape:\n\
             {{\"signal\": \"LONG\", \"confidence\": 75, \"entry_price\": 0, \"tp_price\": 0, \
             \"sl_price\": 0, \"reason\": \"...\"}}\n"
        ),
        DecisionSchema::Scored { .. } => format!(
            "You are a professional cryptocurrency quantitative analyst. \
             Using only the market snapshot below, judge the trend.\n\
             \n\
             {data}\n\
             Indicators marked n/a have insufficient history; do not guess their values.\n\
             \n\
             Tasks:\n\
             1. Give a bullish confidence score (confidence) from 0 to 100.\n\
             2. Give a short reason, at most {MAX_REASON_CHARS} characters.\n\
             \n\
             Reply with pure JSON only, in exactly this shape:\n\
             {{\"confidence\": 75, \"reason\": \"...\"}}\n"
        ),
    }
}
