//! Configuration module

pub mod loader;
pub mod types;

pub use loader::{load_config, FileConfigSource, StaticConfigSource};
pub use types::{AppSettings, BridgeConfig, ExchangeCredentials, GlobalSizingConfig, SizingMode};
