//! Bounded-lifetime cache in front of a remote index.
//!
//! Queries are answered from a snapshot of the index's agent listing. A stale
//! snapshot is refreshed before answering; if the refresh fails the stale
//! snapshot keeps serving and the failure is only logged.

use super::index::{CapabilityPublication, DiscoveryIndex, IndexedAgent};
use super::DiscoveryQuery;
use crate::agent::{ConnectOptions, ConnectionResult, TaskRecord};
use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct Snapshot {
    fetched_at: Instant,
    invalidated: bool,
    agents: Vec<IndexedAgent>,
}

pub struct CachedDiscoveryIndex {
    inner: Arc<dyn DiscoveryIndex>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    /// Serializes refreshes so concurrent stale readers fetch once
    refresh: Mutex<()>,
}

impl CachedDiscoveryIndex {
    pub fn new(inner: Arc<dyn DiscoveryIndex>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            snapshot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    fn is_stale(&self) -> bool {
        match &*self.snapshot.read() {
            Some(snapshot) => snapshot.invalidated || snapshot.fetched_at.elapsed() >= self.ttl,
            None => true,
        }
    }

    /// Mark the snapshot stale so the next query refetches.
    pub fn invalidate(&self) {
        if let Some(snapshot) = self.snapshot.write().as_mut() {
            snapshot.invalidated = true;
        }
    }

    async fn ensure_fresh(&self) {
        if !self.is_stale() {
            return;
        }
        let _refresh = self.refresh.lock().await;
        // Another reader may have refreshed while this one waited
        if !self.is_stale() {
            return;
        }

        match self.inner.list_agents().await {
            Ok(agents) => {
                debug!(agents = agents.len(), "Refreshed discovery index cache");
                *self.snapshot.write() = Some(Snapshot {
                    fetched_at: Instant::now(),
                    invalidated: false,
                    agents,
                });
            }
            Err(err) => {
                let cached = self
                    .snapshot
                    .read()
                    .as_ref()
                    .map_or(0, |snapshot| snapshot.agents.len());
                warn!(
                    event = "remote_degraded",
                    error = %err,
                    cached_agents = cached,
                    "Discovery index refresh failed; serving stale cache"
                );
            }
        }
    }
}

#[async_trait]
impl DiscoveryIndex for CachedDiscoveryIndex {
    async fn initialize(&self) -> Result<(), ApiError> {
        self.inner.initialize().await
    }

    async fn list_agents(&self) -> Result<Vec<IndexedAgent>, ApiError> {
        self.ensure_fresh().await;
        Ok(self
            .snapshot
            .read()
            .as_ref()
            .map(|snapshot| snapshot.agents.clone())
            .unwrap_or_default())
    }

    async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<IndexedAgent>, ApiError> {
        self.ensure_fresh().await;
        Ok(self
            .snapshot
            .read()
            .as_ref()
            .map(|snapshot| {
                snapshot
                    .agents
                    .iter()
                    .filter(|agent| agent.matches(query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn publish_agent_capabilities(
        &self,
        agent_id: &str,
        publication: &CapabilityPublication,
    ) -> Result<(), ApiError> {
        self.inner
            .publish_agent_capabilities(agent_id, publication)
            .await?;
        self.invalidate();
        Ok(())
    }

    async fn get_agent_capabilities(
        &self,
        agent_id: &str,
    ) -> Result<Option<CapabilityPublication>, ApiError> {
        self.inner.get_agent_capabilities(agent_id).await
    }

    async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        self.inner.get_agent_history(agent_id).await
    }

    async fn record_agent_task(&self, agent_id: &str, task: &TaskRecord) -> Result<(), ApiError> {
        self.inner.record_agent_task(agent_id, task).await
    }

    async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
    ) -> Result<ConnectionResult, ApiError> {
        self.inner.connect_agents(source_id, target_id, options).await
    }

    async fn verify_agent(&self, agent_id: &str, data: &Value) -> Result<bool, ApiError> {
        self.inner.verify_agent(agent_id, data).await
    }
}
