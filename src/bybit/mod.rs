//! Bybit v5 linear perpetuals integration

pub mod adapter;
pub mod messages;
pub mod rest;

pub use adapter::BybitAdapter;
pub use rest::BybitRestClient;
