//! HTTP implementation of [`LedgerClient`] backed by `reqwest`.
//!
//! Every endpoint answers with the envelope
//! `{"response": <payload>, "success": <bool>}`; a false `success` carries
//! the failure reason in `response`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::client::{BalanceKind, LedgerClient, RemoteDirectory};
use crate::error::NodeError;

#[derive(Debug, Deserialize)]
struct Envelope {
    response: serde_json::Value,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct HeadResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    data: String,
}

/// Client for the node's versioned JSON API.
pub struct HttpLedgerClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpLedgerClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Create with the default 30 second timeout.
    pub fn default_for(base_url: impl Into<String>) -> Self {
        Self::new(base_url, Duration::from_secs(30))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = format!("{}/v1/{path}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| NodeError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = resp
            .json()
            .await
            .map_err(|e| NodeError::Http(e.to_string()))?;
        if !envelope.success {
            return Err(NodeError::Api(envelope.response.to_string()));
        }
        Ok(serde_json::from_value(envelope.response)?)
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn head(&self) -> Result<String, NodeError> {
        let head: HeadResponse = self.get_json("head").await?;
        Ok(head.hash)
    }

    async fn directory_block(&self, hash: &str) -> Result<RemoteDirectory, NodeError> {
        self.get_json(&format!("directory/{hash}")).await
    }

    async fn raw_data(&self, hash: &str) -> Result<Vec<u8>, NodeError> {
        let raw: RawResponse = self.get_json(&format!("raw/{hash}")).await?;
        Ok(hex::decode(raw.data)?)
    }

    async fn balance(&self, kind: BalanceKind, address: &str) -> Result<i64, NodeError> {
        self.get_json(&format!("balance/{}/{address}", kind.as_path()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_failure_becomes_api_error() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"response": "unknown hash", "success": false}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.response.as_str(), Some("unknown hash"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpLedgerClient::default_for("http://localhost:8088/");
        assert_eq!(client.base_url, "http://localhost:8088");
    }
}
