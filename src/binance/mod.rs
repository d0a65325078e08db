//! Binance USDⓈ-M futures integration

pub mod adapter;
pub mod messages;
pub mod rest;

pub use adapter::BinanceAdapter;
pub use rest::BinanceRestClient;
