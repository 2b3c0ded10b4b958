//! Domain types for SignalCast

pub mod bar;
pub mod decision;
pub mod series;

pub use bar::Bar;
pub use decision::{Signal, TradeDecision, UNAVAILABLE_REASON};
pub use series::{PriceSeries, SeriesError};
