//! Remote discovery index contract.

use super::DiscoveryQuery;
use crate::agent::{AgentRecord, ConnectOptions, ConnectionResult, TaskRecord};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Tags and metadata an agent publishes to the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityPublication {
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// An agent as the index knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedAgent {
    pub agent: AgentRecord,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl IndexedAgent {
    /// Same superset and exact-filter rule as the local capability ledger.
    pub fn matches(&self, query: &DiscoveryQuery) -> bool {
        query
            .capabilities
            .iter()
            .all(|tag| self.capabilities.contains(tag))
            && query.filters.iter().all(|(key, value)| {
                self.metadata.get(key) == Some(value) || self.agent.metadata.get(key) == Some(value)
            })
    }
}

#[async_trait]
pub trait DiscoveryIndex: Send + Sync {
    async fn initialize(&self) -> Result<(), ApiError>;

    /// Every agent the index knows, used to refresh caches.
    async fn list_agents(&self) -> Result<Vec<IndexedAgent>, ApiError>;

    async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<IndexedAgent>, ApiError>;

    async fn publish_agent_capabilities(
        &self,
        agent_id: &str,
        publication: &CapabilityPublication,
    ) -> Result<(), ApiError>;

    async fn get_agent_capabilities(
        &self,
        agent_id: &str,
    ) -> Result<Option<CapabilityPublication>, ApiError>;

    async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError>;

    async fn record_agent_task(&self, agent_id: &str, task: &TaskRecord) -> Result<(), ApiError>;

    async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
    ) -> Result<ConnectionResult, ApiError>;

    async fn verify_agent(&self, agent_id: &str, data: &Value) -> Result<bool, ApiError>;
}
