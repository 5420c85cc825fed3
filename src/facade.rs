//! Agora: the assembled interoperability core.
//!
//! [`Agora`] wires the registry, reputation ledger, discovery service and thread
//! engine over one storage backend and exposes their combined surface. Every
//! component stays reachable through accessors for callers that need more than
//! the facade offers.

use crate::adapter::PlatformAdapter;
use crate::agent::{
    AgentConfig, AgentPatch, AgentRecord, ConnectOptions, ConnectionRecord, TaskOptions,
    TaskRecord, TaskRequest, TaskResult,
};
use crate::cancel::CallContext;
use crate::capabilities::CapabilityLedger;
use crate::config::AgoraConfig;
use crate::discovery::{DiscoveryIndex, DiscoveryQuery, DiscoveryService, HttpDiscoveryIndex};
use crate::error::ApiError;
use crate::protocol::{
    self, Capability, CapabilityHandler, Message, NewMessage, Thread, ThreadEngine, ThreadOptions,
};
use crate::registry::AgentRegistry;
use crate::reputation::{HistoryReputationLedger, ReputationRecord};
use crate::store::{Record, Repository, StoreBackend};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

pub struct Agora {
    config: AgoraConfig,
    backend: StoreBackend,
    reputation: Arc<HistoryReputationLedger>,
    registry: Arc<AgentRegistry>,
    discovery: DiscoveryService,
    threads: Arc<ThreadEngine>,
}

impl Agora {
    /// Assemble from configuration. A configured `discovery.remote_url` attaches
    /// an HTTP index.
    pub fn from_config(config: AgoraConfig) -> Result<Self, ApiError> {
        let index = match &config.discovery.remote_url {
            Some(url) => Some(Arc::new(HttpDiscoveryIndex::new(
                url,
                config.discovery.request_timeout(),
            )?) as Arc<dyn DiscoveryIndex>),
            None => None,
        };
        Self::assemble(config, index)
    }

    /// Assemble with a caller-supplied remote index, ignoring `remote_url`.
    pub fn with_discovery_index(
        config: AgoraConfig,
        index: Arc<dyn DiscoveryIndex>,
    ) -> Result<Self, ApiError> {
        Self::assemble(config, Some(index))
    }

    /// Default configuration over memory storage.
    pub fn in_memory() -> Result<Self, ApiError> {
        Self::from_config(AgoraConfig::default())
    }

    fn assemble(
        config: AgoraConfig,
        index: Option<Arc<dyn DiscoveryIndex>>,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let backend = config.storage.open()?;

        let reputation = Arc::new(HistoryReputationLedger::new(
            backend.repository("reputation")?,
            config.reputation.clone(),
        ));
        let capabilities = Arc::new(CapabilityLedger::new(backend.repository("capabilities")?));
        let registry = Arc::new(
            AgentRegistry::new(
                config.registry.clone(),
                backend.repository("agents")?,
                backend.repository("connections")?,
                capabilities,
            )
            .with_reputation(reputation.clone()),
        );

        let mut discovery = DiscoveryService::new(
            registry.clone(),
            backend.repository("tasks")?,
            config.discovery.clone(),
        );
        if let Some(index) = index {
            discovery = discovery.with_index(index);
        }

        let threads = Arc::new(ThreadEngine::new(
            backend.repository("threads")?,
            backend.repository("thread_capabilities")?,
        ));

        Ok(Self {
            config,
            backend,
            reputation,
            registry,
            discovery,
            threads,
        })
    }

    /// Initialize the ledger, registry and remote index. Idempotent.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        self.registry.initialize().await?;
        self.discovery.initialize().await?;
        info!(
            platforms = ?self.registry.platforms(),
            remote_index = self.discovery.has_index(),
            backend = ?self.config.storage.backend,
            "Agora initialized"
        );
        Ok(())
    }

    pub fn register_adapter(&self, adapter: Arc<dyn PlatformAdapter>) -> bool {
        self.registry.register_adapter(adapter)
    }

    pub fn config(&self) -> &AgoraConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn reputation(&self) -> &Arc<HistoryReputationLedger> {
        &self.reputation
    }

    pub fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }

    /// Shared engine, e.g. for `BridgeAdapter::with_thread_engine`.
    pub fn thread_engine(&self) -> &Arc<ThreadEngine> {
        &self.threads
    }

    /// A repository on the same backend, e.g. for adapter id mappings.
    pub fn repository<V: Record>(&self, collection: &str) -> Result<Arc<dyn Repository<V>>, ApiError> {
        Ok(self.backend.repository(collection)?)
    }

    /// Flush the persistent backend. A no-op for memory storage.
    pub fn flush(&self) -> Result<(), ApiError> {
        if let StoreBackend::Sled(store) = &self.backend {
            store.flush()?;
        }
        Ok(())
    }

    pub async fn create_agent(
        &self,
        platform: &str,
        config: AgentConfig,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        self.registry.create_agent(platform, config, ctx).await
    }

    pub async fn create_agents(
        &self,
        batch: Vec<(String, AgentConfig)>,
        ctx: &CallContext,
    ) -> Vec<Result<AgentRecord, ApiError>> {
        self.registry.create_agents(batch, ctx).await
    }

    pub async fn run_agent(
        &self,
        agent_id: &str,
        task: Value,
        options: &TaskOptions,
        ctx: &CallContext,
    ) -> Result<TaskResult, ApiError> {
        self.registry.run_agent(agent_id, task, options, ctx).await
    }

    pub async fn run_agents(
        &self,
        batch: Vec<TaskRequest>,
        ctx: &CallContext,
    ) -> Vec<Result<TaskResult, ApiError>> {
        self.registry.run_agents(batch, ctx).await
    }

    pub async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
        ctx: &CallContext,
    ) -> Result<ConnectionRecord, ApiError> {
        self.registry
            .connect_agents(source_id, target_id, options, ctx)
            .await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord, ApiError> {
        self.registry.get_agent(agent_id).await
    }

    pub async fn get_all_agents(&self) -> Result<Vec<AgentRecord>, ApiError> {
        self.registry.get_all_agents().await
    }

    pub async fn update_agent(
        &self,
        agent_id: &str,
        patch: &AgentPatch,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        self.registry.update_agent(agent_id, patch, ctx).await
    }

    pub async fn delete_agent(&self, agent_id: &str, ctx: &CallContext) -> Result<(), ApiError> {
        self.registry.delete_agent(agent_id, ctx).await
    }

    pub async fn get_all_connections(&self) -> Result<Vec<ConnectionRecord>, ApiError> {
        self.registry.get_all_connections().await
    }

    pub async fn get_agent_reputation(&self, agent_id: &str) -> Result<f64, ApiError> {
        self.registry.get_agent_reputation(agent_id).await
    }

    pub async fn update_agent_reputation(
        &self,
        agent_id: &str,
        rating: f64,
        rater_id: &str,
        evidence: Value,
    ) -> Result<ReputationRecord, ApiError> {
        self.registry
            .update_agent_reputation(agent_id, rating, rater_id, evidence)
            .await
    }

    pub async fn discover_agents(&self, query: &DiscoveryQuery) -> Result<Vec<AgentRecord>, ApiError> {
        self.discovery.discover_agents(query).await
    }

    pub async fn register_agent_capabilities(
        &self,
        agent_id: &str,
        capabilities: &[String],
        metadata: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>, ApiError> {
        self.discovery
            .register_agent_capabilities(agent_id, capabilities, metadata)
            .await
    }

    pub async fn get_agent_capabilities(&self, agent_id: &str) -> Result<BTreeSet<String>, ApiError> {
        self.discovery.get_agent_capabilities(agent_id).await
    }

    pub async fn get_agent_history(&self, agent_id: &str) -> Result<Vec<TaskRecord>, ApiError> {
        self.discovery.get_agent_history(agent_id).await
    }

    pub async fn record_agent_task(&self, agent_id: &str, data: Value) -> Result<TaskRecord, ApiError> {
        self.discovery.record_agent_task(agent_id, data).await
    }

    pub async fn verify_agent(&self, agent_id: &str, data: &Value) -> Result<bool, ApiError> {
        self.discovery.verify_agent(agent_id, data).await
    }

    pub async fn create_thread(&self, options: ThreadOptions) -> Result<Thread, ApiError> {
        self.threads.create_thread(options).await
    }

    pub async fn add_message(&self, thread_id: &str, message: NewMessage) -> Result<Message, ApiError> {
        self.threads.add_message(thread_id, message).await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, ApiError> {
        self.threads.get_thread(thread_id).await
    }

    pub async fn get_all_threads(&self) -> Result<Vec<Thread>, ApiError> {
        self.threads.get_all_threads().await
    }

    pub fn create_capability_request(
        &self,
        capability_type: &str,
        data: Value,
    ) -> Result<Capability, ApiError> {
        protocol::create_capability_request(capability_type, data)
    }

    pub async fn respond_to_capability(
        &self,
        thread_id: &str,
        capability_id: &str,
        response: Value,
    ) -> Result<Message, ApiError> {
        self.threads
            .respond_to_capability(thread_id, capability_id, response)
            .await
    }

    pub fn register_capability_handler(
        &self,
        capability_type: impl Into<String>,
        handler: Arc<dyn CapabilityHandler>,
    ) -> Option<Arc<dyn CapabilityHandler>> {
        self.threads
            .register_capability_handler(capability_type, handler)
    }
}
