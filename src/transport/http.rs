//! Shared HTTP transport for all exchange adapters

use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::common::errors::{BridgeError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection-pooled HTTP client plus the request settings every adapter shares
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    recv_window_ms: u64,
}

impl HttpTransport {
    /// Create a transport with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            recv_window_ms: 5000,
        })
    }

    /// Set the validity window sent with signed requests
    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn recv_window_ms(&self) -> u64 {
        self.recv_window_ms
    }

    /// Send a request and return the status with the raw body
    ///
    /// Status handling is left to the caller since each exchange reports
    /// errors in its own envelope.
    pub async fn execute(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, body_len = body.len(), "Received response");
        Ok((status, body))
    }
}
