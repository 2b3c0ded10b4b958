//! Market data providers

pub mod binance;
pub mod csv_import;
pub mod provider;

pub use binance::BinanceProvider;
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider};
