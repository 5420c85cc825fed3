//! HTTP client for a remote discovery index service.

use super::index::{CapabilityPublication, DiscoveryIndex, IndexedAgent};
use super::DiscoveryQuery;
use crate::agent::{ConnectOptions, ConnectionResult, TaskRecord};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectBody<'a> {
    source_id: &'a str,
    target_id: &'a str,
    options: &'a ConnectOptions,
}

#[derive(Deserialize)]
struct VerifyResponse {
    verified: bool,
}

pub struct HttpDiscoveryIndex {
    base_url: Url,
    client: Client,
}

impl HttpDiscoveryIndex {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::ConfigError(format!("Invalid discovery url '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::ConfigError(format!(
                "Discovery url '{}' cannot carry a path",
                base_url
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url: parsed,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so an opaque agent id always stays one path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send and decode a JSON body; non-success statuses become `Remote` errors.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Remote(format!("Index returned {}: {}", status, body)));
        }
        Ok(response.json::<T>().await?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Remote(format!("Index returned {}", status)));
        }
        Ok(())
    }
}

#[async_trait]
impl DiscoveryIndex for HttpDiscoveryIndex {
    async fn initialize(&self) -> Result<(), ApiError> {
        debug!(base_url = %self.base_url, "Discovery index client ready");
        Ok(())
    }

    async fn list_agents(&self) -> Result<Vec<IndexedAgent>, ApiError> {
        self.send_json(self.client.get(self.url(&["agents"]))).await
    }

    async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<IndexedAgent>, ApiError> {
        self.send_json(self.client.post(self.url(&["agents", "discover"])).json(query))
            .await
    }

    async fn publish_agent_capabilities(
        &self,
        agent_id: &str,
        publication: &CapabilityPublication,
    ) -> Result<(), ApiError> {
        let url = self.url(&["agents", agent_id, "capabilities"]);
        self.send(self.client.put(url).json(publication)).await
    }

    async fn get_agent_capabilities(
        &self,
        agent_id: &str,
    ) -> Result<Option<CapabilityPublication>, ApiError> {
        let url = self.url(&["agents", agent_id, "capabilities"]);
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::Remote(format!(
                "Index returned {}",
                response.status()
            )));
        }
        Ok(Some(response.json().await?))
    }

    async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        let url = self.url(&["agents", agent_id, "history"]);
        self.send_json(self.client.get(url)).await
    }

    async fn record_agent_task(&self, agent_id: &str, task: &TaskRecord) -> Result<(), ApiError> {
        let url = self.url(&["agents", agent_id, "tasks"]);
        self.send(self.client.post(url).json(task)).await
    }

    async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
    ) -> Result<ConnectionResult, ApiError> {
        let body = ConnectBody {
            source_id,
            target_id,
            options,
        };
        self.send_json(self.client.post(self.url(&["connections"])).json(&body))
            .await
    }

    async fn verify_agent(&self, agent_id: &str, data: &Value) -> Result<bool, ApiError> {
        let url = self.url(&["agents", agent_id, "verify"]);
        let response: VerifyResponse = self.send_json(self.client.post(url).json(data)).await?;
        Ok(response.verified)
    }
}
