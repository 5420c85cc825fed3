//! Discovery Service
//!
//! Finds agents by capability. Local candidates come from the registry and its
//! capability ledger; an optional remote index contributes agents the registry
//! does not know. Remote failures never fail a discovery call: every remote
//! operation degrades to a local fallback and logs a `remote_degraded` warning.

pub mod cache;
pub mod http;
pub mod index;

use crate::agent::{AgentRecord, ConnectOptions, ConnectionResult, TaskRecord};
use crate::cancel::CallContext;
use crate::error::ApiError;
use crate::registry::AgentRegistry;
use crate::store::Repository;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub use self::cache::CachedDiscoveryIndex;
pub use self::http::HttpDiscoveryIndex;
pub use self::index::{CapabilityPublication, DiscoveryIndex, IndexedAgent};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryQuery {
    /// Required tags; empty matches every agent
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Exact key/value matches against capability or record metadata
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_reputation_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl DiscoveryQuery {
    pub fn with_capabilities<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn min_reputation(mut self, score: f64) -> Self {
        self.min_reputation_score = Some(score);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_min_reputation")]
    pub default_min_reputation: f64,
    /// Lifetime of the remote index snapshot
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Base url of a remote index; none disables remote discovery
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_limit() -> usize {
    10
}

fn default_min_reputation() -> f64 {
    0.5
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_min_reputation: default_min_reputation(),
            cache_ttl_secs: default_cache_ttl_secs(),
            remote_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DiscoveryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn remote_degraded(operation: &'static str, agent_id: &str, err: &ApiError) {
    warn!(
        event = "remote_degraded",
        operation,
        agent_id = %agent_id,
        error = %err,
        "Discovery index call failed; using local fallback"
    );
}

pub struct DiscoveryService {
    registry: Arc<AgentRegistry>,
    tasks: Arc<dyn Repository<TaskRecord>>,
    index: Option<Arc<dyn DiscoveryIndex>>,
    config: DiscoveryConfig,
}

impl DiscoveryService {
    pub fn new(
        registry: Arc<AgentRegistry>,
        tasks: Arc<dyn Repository<TaskRecord>>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            registry,
            tasks,
            index: None,
            config,
        }
    }

    /// Attach a remote index behind a cache with the configured lifetime.
    pub fn with_index(mut self, index: Arc<dyn DiscoveryIndex>) -> Self {
        self.index = Some(Arc::new(CachedDiscoveryIndex::new(
            index,
            self.config.cache_ttl(),
        )));
        self
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Initialize the remote index. A failure leaves discovery local-only for
    /// the failed call paths and is only logged.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        if let Some(index) = &self.index {
            if let Err(err) = index.initialize().await {
                remote_degraded("initialize", "-", &err);
            }
        }
        Ok(())
    }

    /// Ranked agents matching `query`: local candidates in registry order, then
    /// remote agents unknown locally, filtered by reputation and truncated.
    pub async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<AgentRecord>, ApiError> {
        let agents = self.registry.get_all_agents().await?;
        let ledger = self.registry.reputation();
        let capabilities = self.registry.capabilities();

        let mut candidates = Vec::new();
        for mut record in agents.iter().cloned() {
            let entry = capabilities.get(&record.id)?;
            let tags = entry.as_ref().map(|e| &e.capabilities);
            let has_tags = query
                .capabilities
                .iter()
                .all(|tag| tags.is_some_and(|set| set.contains(tag)));
            let filters_match = query.filters.iter().all(|(key, value)| {
                entry
                    .as_ref()
                    .is_some_and(|e| e.metadata.get(key) == Some(value))
                    || record.metadata.get(key) == Some(value)
            });
            if !(has_tags && filters_match) {
                continue;
            }
            if let Some(ledger) = ledger {
                record.reputation_score = ledger.get_reputation_score(&record.id).await?;
            }
            candidates.push(record);
        }
        let local_matches = candidates.len();

        if let Some(index) = &self.index {
            match index.discover_agents(query).await {
                Ok(remote) => {
                    let mut known: HashSet<String> =
                        agents.iter().map(|record| record.id.clone()).collect();
                    for indexed in remote {
                        // Local data is authoritative for ids the registry knows
                        if indexed.matches(query) && known.insert(indexed.agent.id.clone()) {
                            candidates.push(indexed.agent);
                        }
                    }
                }
                Err(err) => remote_degraded("discover_agents", "-", &err),
            }
        }

        let min_score = query
            .min_reputation_score
            .unwrap_or(self.config.default_min_reputation);
        let limit = query.limit.unwrap_or(self.config.default_limit);
        let found: Vec<AgentRecord> = candidates
            .into_iter()
            .filter(|record| record.reputation_score >= min_score)
            .take(limit)
            .collect();

        debug!(
            capabilities = ?query.capabilities,
            local_matches,
            returned = found.len(),
            "Discovery query answered"
        );
        Ok(found)
    }

    /// Union tags into the local ledger, then publish the full set best-effort.
    pub async fn register_agent_capabilities(
        &self,
        agent_id: &str,
        capabilities: &[String],
        metadata: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>, ApiError> {
        let entry = self
            .registry
            .register_capabilities(agent_id, capabilities, metadata, &CallContext::none())
            .await?;

        if let Some(index) = &self.index {
            let publication = CapabilityPublication {
                capabilities: entry.capabilities.clone(),
                metadata: entry.metadata.clone(),
            };
            if let Err(err) = index.publish_agent_capabilities(agent_id, &publication).await {
                remote_degraded("publish_agent_capabilities", agent_id, &err);
            }
        }
        Ok(entry.capabilities)
    }

    /// Local tags when the ledger has an entry, else the index's, else empty.
    pub async fn get_agent_capabilities(&self, agent_id: &str) -> Result<BTreeSet<String>, ApiError> {
        if let Some(entry) = self.registry.capabilities().get(agent_id)? {
            return Ok(entry.capabilities);
        }
        if let Some(index) = &self.index {
            match index.get_agent_capabilities(agent_id).await {
                Ok(Some(publication)) => return Ok(publication.capabilities),
                Ok(None) => {}
                Err(err) => remote_degraded("get_agent_capabilities", agent_id, &err),
            }
        }
        Ok(BTreeSet::new())
    }

    /// Log a task locally. A boolean `success` field also counts an
    /// interaction for locally registered agents.
    pub async fn record_agent_task(&self, agent_id: &str, data: Value) -> Result<TaskRecord, ApiError> {
        if agent_id.trim().is_empty() {
            return Err(ApiError::Validation("Agent id cannot be empty".to_string()));
        }
        let task = TaskRecord {
            id: crate::types::new_id(),
            agent_id: agent_id.to_string(),
            success: data.get("success").and_then(Value::as_bool),
            data,
            recorded_at: crate::types::now(),
        };
        self.tasks.put(&task.id, &task)?;

        if let Some(success) = task.success {
            match self.registry.record_interaction(agent_id, success).await {
                Ok(()) | Err(ApiError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        if let Some(index) = &self.index {
            if let Err(err) = index.record_agent_task(agent_id, &task).await {
                remote_degraded("record_agent_task", agent_id, &err);
            }
        }
        Ok(task)
    }

    fn local_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        let mut history: Vec<TaskRecord> = self
            .tasks
            .list()?
            .into_iter()
            .filter(|task| task.agent_id == agent_id)
            .collect();
        history.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(history)
    }

    /// The index's history for the agent, else the local task log.
    pub async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        if let Some(index) = &self.index {
            match index.get_agent_history(agent_id).await {
                Ok(history) => return Ok(history),
                Err(err) => remote_degraded("get_agent_history", agent_id, &err),
            }
        }
        self.local_history(agent_id)
    }

    /// The index's verdict, else: known locally with reputation at or above
    /// the default minimum.
    pub async fn verify_agent(&self, agent_id: &str, data: &Value) -> Result<bool, ApiError> {
        if let Some(index) = &self.index {
            match index.verify_agent(agent_id, data).await {
                Ok(verified) => return Ok(verified),
                Err(err) => remote_degraded("verify_agent", agent_id, &err),
            }
        }
        match self.registry.get_agent_reputation(agent_id).await {
            Ok(score) => Ok(score >= self.config.default_min_reputation),
            Err(ApiError::NotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Ask the index to connect two agents. `None` when no index is attached or
    /// the call failed.
    pub async fn connect_via_index(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
    ) -> Option<ConnectionResult> {
        let index = self.index.as_ref()?;
        match index.connect_agents(source_id, target_id, options).await {
            Ok(result) => Some(result),
            Err(err) => {
                remote_degraded("connect_agents", source_id, &err);
                None
            }
        }
    }
}
