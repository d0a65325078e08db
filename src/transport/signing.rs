//! HMAC-SHA256 request signing shared by the exchange adapters

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{BridgeError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Current Unix timestamp in milliseconds
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Sign a payload and return the lowercase hex HMAC-SHA256 digest
pub fn sign_hex(secret: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BridgeError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build a form-encoded query string, preserving parameter order
pub fn build_query(params: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Binance-style signed query: params, then `recvWindow` and `timestamp`,
/// then a `signature` over everything before it
pub fn binance_signed_query(
    secret: &str,
    params: &[(&str, String)],
    recv_window_ms: u64,
    timestamp_ms: i64,
) -> Result<String> {
    let mut all_params = params.to_vec();
    all_params.push(("recvWindow", recv_window_ms.to_string()));
    all_params.push(("timestamp", timestamp_ms.to_string()));

    let query = build_query(&all_params);
    let signature = sign_hex(secret, &query)?;
    Ok(format!("{}&signature={}", query, signature))
}

/// Bybit v5 signature over `timestamp + api_key + recv_window + payload`
///
/// `payload` is the JSON body for POST requests and the query string for GET.
pub fn bybit_signature(
    api_key: &str,
    secret: &str,
    timestamp_ms: i64,
    recv_window_ms: u64,
    payload: &str,
) -> Result<String> {
    let message = format!("{}{}{}{}", timestamp_ms, api_key, recv_window_ms, payload);
    sign_hex(secret, &message)
}

/// Authentication headers for Bybit v5 requests
#[derive(Debug, Clone)]
pub struct BybitAuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: i64,
    pub recv_window: u64,
}

impl BybitAuthHeaders {
    /// Sign `payload` with the current timestamp
    pub fn generate(api_key: &str, secret: &str, recv_window_ms: u64, payload: &str) -> Result<Self> {
        let timestamp = timestamp_ms();
        let signature = bybit_signature(api_key, secret, timestamp, recv_window_ms, payload)?;

        Ok(Self {
            api_key: api_key.to_string(),
            signature,
            timestamp,
            recv_window: recv_window_ms,
        })
    }

    /// Add authentication headers to a reqwest RequestBuilder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-SIGN", &self.signature)
            .header("X-BAPI-TIMESTAMP", self.timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", self.recv_window.to_string())
    }
}
