//! Remote state store over a Redis REST endpoint.
//!
//! # Wire Format
//! ```text
//! POST <rest_url>
//! Authorization: Bearer <rest_token>
//! ["GET", "cb:db:contacts-db"]
//!     → {"result": "{\"state\":\"OPEN\",\"failureCount\":5,\"nextAttempt\":1700000030000}"}
//!     → {"result": null}
//! ["SET", "cb:db:contacts-db", "<record json>"]
//!     → {"result": "OK"}
//! errors
//!     → {"error": "..."}
//! ```
//!
//! Compatible with Upstash-style REST gateways. Records are stored as JSON
//! strings so that instances written in other languages can share them.

use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::resilience::state::BreakerState;
use crate::store::{StateStore, StoreError};

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Shared store reached over HTTP.
#[derive(Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    url: Url,
    token: String,
}

impl RemoteStore {
    /// Create a client for the given endpoint.
    ///
    /// Every request, including connection setup, is bounded by `timeout`.
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, StoreError> {
        let url = Url::parse(url)
            .map_err(|e| StoreError::Config(format!("invalid REST URL '{}': {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::Config(format!(
                "unsupported REST URL scheme '{}'",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            token: token.to_string(),
        })
    }

    async fn command(&self, args: Value) -> Result<Value, StoreError> {
        let res = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: RestReply = res.json().await?;
        if let Some(error) = reply.error {
            return Err(StoreError::Remote(error));
        }
        Ok(reply.result)
    }
}

/// Decode a GET result into a record.
///
/// Accepts the JSON-string encoding written by this crate and a plain JSON
/// object, which some gateways return after deserializing on their side.
fn decode_record(result: Value) -> Result<Option<BreakerState>, StoreError> {
    match result {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        other => Ok(Some(serde_json::from_value(other)?)),
    }
}

#[async_trait]
impl StateStore for RemoteStore {
    async fn get(&self, key: &str) -> Result<Option<BreakerState>, StoreError> {
        let result = self.command(json!(["GET", key])).await?;
        decode_record(result)
    }

    async fn set(&self, key: &str, state: &BreakerState) -> Result<(), StoreError> {
        let record = serde_json::to_string(state)?;
        self.command(json!(["SET", key, record])).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("url", &self.url.as_str())
            .finish()
    }
}
