//! Configuration loader

use async_trait::async_trait;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::BridgeConfig;
use crate::common::errors::{BridgeError, Result};
use crate::common::traits::ConfigSource;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with BRIDGE__, `__` as separator)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<BridgeConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("BRIDGE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| BridgeError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| BridgeError::Configuration(e.to_string()))
}

/// Config source that re-reads a TOML file (plus `BRIDGE__` environment
/// overrides) for every snapshot
///
/// The operator may edit the file at any time; nothing is cached. The file
/// may be absent when everything comes from the environment. A snapshot
/// with no exchange entries at all is treated as unconfigured.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn snapshot(&self) -> Option<BridgeConfig> {
        let path = self.path.to_string_lossy().into_owned();
        let loaded = tokio::task::spawn_blocking(move || load_config(Some(&path))).await;

        match loaded {
            Ok(Ok(config)) if config.exchanges.is_empty() => {
                debug!(path = %self.path.display(), "No exchanges configured yet");
                None
            }
            Ok(Ok(config)) => Some(config),
            Ok(Err(e)) => {
                warn!("Failed to load configuration: {}", e);
                None
            }
            Err(e) => {
                warn!("Configuration loader task failed: {}", e);
                None
            }
        }
    }
}

/// In-memory config source, updated by whoever owns the configuration
#[derive(Debug, Default)]
pub struct StaticConfigSource {
    current: RwLock<Option<BridgeConfig>>,
}

impl StaticConfigSource {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            current: RwLock::new(Some(config)),
        }
    }

    /// A source with nothing configured
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the configuration seen by subsequent snapshots
    pub async fn update(&self, config: BridgeConfig) {
        *self.current.write().await = Some(config);
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn snapshot(&self) -> Option<BridgeConfig> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Exchange;
    use crate::config::types::SizingMode;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "trade_mirror_{}_{}.toml",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_toml() {
        let path = write_temp_config(
            "load",
            r#"
[exchanges.bybit]
active = true
api_key = "key"
api_secret = "secret"
base_url = "https://api-testnet.bybit.com"

[global]
sizing_mode = "percent"
sizing_value = 2.5
leverage = 15

[settings]
edit_delay_ms = 750
"#,
        );

        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        let bybit = config.usable_credentials(Exchange::Bybit).unwrap();
        assert_eq!(
            bybit.base_url_for(Exchange::Bybit),
            "https://api-testnet.bybit.com"
        );
        assert_eq!(config.global.sizing_mode, SizingMode::Percent);
        assert_eq!(config.global.sizing_value, dec!(2.5));
        assert_eq!(config.global.leverage, 15);
        assert_eq!(config.settings.edit_delay_ms, 750);
        assert_eq!(config.settings.dedup_window_ms, 1000);
    }

    #[test]
    fn test_load_config_accepts_camel_case_keys() {
        let path = write_temp_config(
            "camel",
            r#"
[exchanges.bybit]
active = true
apiKey = "key"
apiSecret = "secret"
baseUrl = "https://api-testnet.bybit.com"

[global]
sizingMode = "percent"
sizingValue = 5
leverage = 10
"#,
        );

        let config = load_config(path.to_str()).unwrap();
        std::fs::remove_file(&path).ok();

        let bybit = config.usable_credentials(Exchange::Bybit).unwrap();
        assert_eq!(bybit.api_key, "key");
        assert_eq!(
            bybit.base_url_for(Exchange::Bybit),
            "https://api-testnet.bybit.com"
        );
        assert_eq!(config.global.sizing_mode, SizingMode::Percent);
        assert_eq!(config.global.sizing_value, dec!(5));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_environment() {
        let source = FileConfigSource::new("/nonexistent/trade_mirror/config.toml");
        assert!(source.snapshot().await.is_none());

        std::env::set_var("BRIDGE__EXCHANGES__BINANCE__ACTIVE", "true");
        std::env::set_var("BRIDGE__EXCHANGES__BINANCE__API_KEY", "env-key");
        std::env::set_var("BRIDGE__EXCHANGES__BINANCE__API_SECRET", "env-secret");

        let snapshot = source.snapshot().await;

        std::env::remove_var("BRIDGE__EXCHANGES__BINANCE__ACTIVE");
        std::env::remove_var("BRIDGE__EXCHANGES__BINANCE__API_KEY");
        std::env::remove_var("BRIDGE__EXCHANGES__BINANCE__API_SECRET");

        let config = snapshot.unwrap();
        let binance = config.usable_credentials(Exchange::Binance).unwrap();
        assert_eq!(binance.api_key, "env-key");
    }

    #[tokio::test]
    async fn test_static_source_update_and_clear() {
        let source = StaticConfigSource::empty();
        assert!(source.snapshot().await.is_none());

        source.update(BridgeConfig::default()).await;
        assert!(source.snapshot().await.is_some());

        source.clear().await;
        assert!(source.snapshot().await.is_none());
    }
}
