//! Per-venue normalizers.

pub mod binance;
pub mod gateio;

pub use binance::BinanceNormalizer;
pub use gateio::GateIoNormalizer;
