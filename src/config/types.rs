//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::common::types::Exchange;

/// Main application configuration
///
/// `exchanges` and `global` are operator-editable and re-read for every
/// intent; `settings` is read once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Per-exchange credentials keyed by exchange name
    #[serde(default)]
    pub exchanges: BTreeMap<Exchange, ExchangeCredentials>,
    /// Sizing and leverage applied to every OPEN
    #[serde(default)]
    pub global: GlobalSizingConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl BridgeConfig {
    /// Credentials for an exchange, if it is active and has keys
    pub fn usable_credentials(&self, exchange: Exchange) -> Option<&ExchangeCredentials> {
        self.exchanges.get(&exchange).filter(|c| c.is_usable())
    }
}

/// Credentials and endpoint for one exchange account
///
/// The `config` loader lowercases keys, so each camelCase alias also has a
/// lowercase spelling.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ExchangeCredentials {
    /// Whether intents are mirrored to this exchange
    #[serde(default)]
    pub active: bool,
    #[serde(default, alias = "apiKey", alias = "apikey")]
    pub api_key: String,
    #[serde(default, alias = "apiSecret", alias = "apisecret")]
    pub api_secret: String,
    /// REST base URL; the exchange's production endpoint when unset
    #[serde(default, alias = "baseUrl", alias = "baseurl")]
    pub base_url: Option<String>,
}

impl ExchangeCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            active: true,
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Active with a non-empty key pair
    pub fn is_usable(&self) -> bool {
        self.active && !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }

    /// Base URL without a trailing slash
    pub fn base_url_for(&self, exchange: Exchange) -> String {
        let url = match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.as_str(),
            _ => default_base_url(exchange),
        };
        url.trim_end_matches('/').to_string()
    }
}

impl std::fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("active", &self.active)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn default_base_url(exchange: Exchange) -> &'static str {
    match exchange {
        Exchange::Binance => "https://fapi.binance.com",
        Exchange::Bybit => "https://api.bybit.com",
    }
}

/// How the margin for a new position is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// `sizing_value` is the margin in USDT
    #[default]
    Fixed,
    /// `sizing_value` is a percentage of the available USDT balance
    Percent,
}

/// Operator sizing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSizingConfig {
    #[serde(default, alias = "sizingMode", alias = "sizingmode")]
    pub sizing_mode: SizingMode,
    #[serde(default, alias = "sizingValue", alias = "sizingvalue")]
    pub sizing_value: Decimal,
    /// Requested leverage cap; the exchange may allow less
    #[serde(default = "default_leverage")]
    pub leverage: u32,
}

impl GlobalSizingConfig {
    pub fn fixed(margin: Decimal, leverage: u32) -> Self {
        Self {
            sizing_mode: SizingMode::Fixed,
            sizing_value: margin,
            leverage,
        }
    }

    pub fn percent(percent: Decimal, leverage: u32) -> Self {
        Self {
            sizing_mode: SizingMode::Percent,
            sizing_value: percent,
            leverage,
        }
    }

    /// Leverage cap, never below 1x
    pub fn leverage_cap(&self) -> u32 {
        self.leverage.max(1)
    }
}

impl Default for GlobalSizingConfig {
    fn default() -> Self {
        Self {
            sizing_mode: SizingMode::Fixed,
            sizing_value: Decimal::ZERO,
            leverage: default_leverage(),
        }
    }
}

fn default_leverage() -> u32 {
    1
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Identical intents closer together than this are dropped
    #[serde(default = "default_dedup_window")]
    pub dedup_window_ms: u64,
    /// Pause between the cancel and open halves of an EDIT
    #[serde(default = "default_edit_delay")]
    pub edit_delay_ms: u64,
    /// Validity window sent with signed requests
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            dedup_window_ms: default_dedup_window(),
            edit_delay_ms: default_edit_delay(),
            recv_window_ms: default_recv_window(),
        }
    }
}

impl AppSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn edit_delay(&self) -> Duration {
        Duration::from_millis(self.edit_delay_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_dedup_window() -> u64 {
    1000
}

fn default_edit_delay() -> u64 {
    500
}

fn default_recv_window() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_camel_case_snapshot() {
        let json = r#"{
            "exchanges": {
                "binance": {"active": true, "apiKey": "k", "apiSecret": "s", "baseUrl": "https://testnet.binancefuture.com/"},
                "bybit": {"active": false, "apiKey": "", "apiSecret": ""}
            },
            "global": {"sizingMode": "percent", "sizingValue": 5, "leverage": 10}
        }"#;
        let config: BridgeConfig = serde_json::from_str(json).unwrap();

        let binance = config.usable_credentials(Exchange::Binance).unwrap();
        assert_eq!(
            binance.base_url_for(Exchange::Binance),
            "https://testnet.binancefuture.com"
        );
        assert!(config.usable_credentials(Exchange::Bybit).is_none());
        assert_eq!(config.global, GlobalSizingConfig::percent(dec!(5), 10));
        assert_eq!(config.settings.dedup_window_ms, 1000);
    }

    #[test]
    fn test_default_base_urls() {
        let creds = ExchangeCredentials::new("k", "s");
        assert_eq!(creds.base_url_for(Exchange::Bybit), "https://api.bybit.com");
        assert_eq!(creds.base_url_for(Exchange::Binance), "https://fapi.binance.com");
    }

    #[test]
    fn test_inactive_or_keyless_is_unusable() {
        let mut creds = ExchangeCredentials::new("k", "s");
        assert!(creds.is_usable());
        creds.active = false;
        assert!(!creds.is_usable());
        assert!(!ExchangeCredentials::new("k", " ").is_usable());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ExchangeCredentials::new("key", "super-secret");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_leverage_cap_floor() {
        assert_eq!(GlobalSizingConfig::fixed(dec!(100), 0).leverage_cap(), 1);
        assert_eq!(GlobalSizingConfig::fixed(dec!(100), 25).leverage_cap(), 25);
    }

    #[test]
    fn test_settings_durations() {
        let settings = AppSettings::default();
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.dedup_window(), Duration::from_millis(1000));
        assert_eq!(settings.edit_delay(), Duration::from_millis(500));
    }
}
