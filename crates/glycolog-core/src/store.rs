//! HTTP client for the remote reading store.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | list   | GET    | `sucre/liste` |
//! | add    | POST   | `sucre/ajouter` |
//! | delete | DELETE | `sucre/supprimer/{id}` |

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Message used when a rejection carries no usable payload.
const GENERIC_REJECTION: &str = "server error";

/// Body of an add request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReading {
    /// Normalized decimal text, e.g. `"1.2"`.
    pub value: String,
    pub note: String,
}

/// Thin wrapper around `reqwest` bound to one store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: Url,
    timeout: Duration,
    http_client: Client,
}

impl StoreClient {
    /// Build a client from a base URL and request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl {
                url: base_url.to_string(),
                message: "URL cannot carry a path".into(),
            });
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::Network)?;

        Ok(Self {
            base_url,
            timeout,
            http_client,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL. Each segment is percent-encoded
    /// on its own, so an id never introduces extra path levels.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            StoreError::Network(err)
        }
    }

    /// Fetch the full listing as raw JSON items.
    pub async fn list(&self) -> Result<Vec<Value>, StoreError> {
        let url = self.endpoint(&["sucre", "liste"])?;
        tracing::debug!(%url, "listing readings");

        let resp = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = self.ensure_success(resp).await?;

        let body: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                StoreError::Decode(format!("listing is not JSON: {e}"))
            }
        })?;

        match body {
            Value::Array(items) => Ok(items),
            other => Err(StoreError::Decode(format!(
                "expected an array of readings, got {other}"
            ))),
        }
    }

    /// Submit a new reading. Returns the value echoed by the store, or the
    /// transmitted value when the acknowledgement carries none.
    pub async fn add(&self, reading: &NewReading) -> Result<String, StoreError> {
        let url = self.endpoint(&["sucre", "ajouter"])?;
        tracing::debug!(%url, value = %reading.value, "adding reading");

        let resp = self
            .http_client
            .post(url)
            .json(reading)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let resp = self.ensure_success(resp).await?;

        let ack: Option<Value> = resp.json().await.ok();
        let echoed = ack.as_ref().and_then(|a| a.get("value")).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(echoed.unwrap_or_else(|| reading.value.clone()))
    }

    /// Delete one reading by id. Any 2xx counts as success.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&["sucre", "supprimer", id])?;
        tracing::debug!(%url, "deleting reading");

        let resp = self
            .http_client
            .delete(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.ensure_success(resp).await?;
        Ok(())
    }

    /// Turn a non-2xx response into [`StoreError::Rejected`].
    pub(crate) async fn ensure_success(&self, resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = rejection_message(&text);
        tracing::warn!(status = status.as_u16(), %message, "store rejected request");
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pick the most specific message from an error payload.
pub(crate) fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_REJECTION.to_string())
}
