//! HTTP client for the Pawlog sync server.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{RemoteCollection, RemoteError, RemoteStore};
use crate::codec::{wire_id, WireRecord};

/// Remote store speaking the server's `/v1/{collection}` REST API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteStore {
    /// `timeout` bounds each request end to end.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the server answers `GET /health` with a success status.
    pub async fn check_health(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %self.base_url, error = %e, "Health check failed");
                false
            }
        }
    }

    fn collection_url(&self, collection: RemoteCollection) -> String {
        format!("{}/v1/{}", self.base_url, collection.name)
    }

    fn record_url(&self, collection: RemoteCollection, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id)
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::unreachable(err.to_string())
    }
}

/// Turns a non-2xx response into `Rejected`, preferring the body's `message`.
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            }
        });

    Err(RemoteError::rejected(status.as_u16(), message))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::rejected(status.as_u16(), format!("invalid response body: {}", e))
        }
    })
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upsert(
        &self,
        collection: RemoteCollection,
        record: WireRecord,
    ) -> Result<WireRecord, RemoteError> {
        let id = wire_id(&record)
            .ok_or_else(|| RemoteError::rejected(StatusCode::BAD_REQUEST.as_u16(), "record has no id"))?
            .to_string();

        let response = self
            .client
            .put(self.record_url(collection, &id))
            .header("Authorization", self.bearer())
            .json(&record)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(check_status(response).await?).await
    }

    async fn delete_by_id(&self, collection: RemoteCollection, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.record_url(collection, id))
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(transport_error)?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(RemoteError::Rejected { code: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn query_by_owner(
        &self,
        collection: RemoteCollection,
        owner_id: &str,
    ) -> Result<Vec<WireRecord>, RemoteError> {
        let response = self
            .client
            .get(self.collection_url(collection))
            .header("Authorization", self.bearer())
            .query(&[("owner_key", collection.owner_key), ("owner", owner_id)])
            .send()
            .await
            .map_err(transport_error)?;

        read_json(check_status(response).await?).await
    }
}
