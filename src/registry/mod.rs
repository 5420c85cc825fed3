//! Agent Registry
//!
//! Single entry point that routes agent operations to the adapter matching the
//! agent's platform tag. The registry owns agent and connection records and keeps
//! the capability and reputation ledgers in step with them.

pub mod adapters;

use crate::adapter::PlatformAdapter;
use crate::agent::{
    validate_agent_config, AgentConfig, AgentPatch, AgentRecord, ConnectOptions,
    ConnectionRecord, TaskOptions, TaskRequest, TaskResult,
};
use crate::cancel::CallContext;
use crate::capabilities::{CapabilityEntry, CapabilityLedger};
use crate::concurrency::EntityLocks;
use crate::error::ApiError;
use crate::reputation::{ReputationLedger, ReputationRecord};
use crate::store::{MemoryRepository, Repository};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use self::adapters::AdapterTable;

/// Rater recorded on ratings the registry submits after `run_agent`.
pub const REGISTRY_RATER: &str = "agent-registry";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Rating submitted for a successful run when neither the caller nor the
    /// result supplies one
    #[serde(default = "default_quality_score")]
    pub default_quality_score: f64,
}

fn default_quality_score() -> f64 {
    0.8
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_quality_score: default_quality_score(),
        }
    }
}

pub struct AgentRegistry {
    config: RegistryConfig,
    adapters: AdapterTable,
    agents: Arc<dyn Repository<AgentRecord>>,
    connections: Arc<dyn Repository<ConnectionRecord>>,
    capabilities: Arc<CapabilityLedger>,
    reputation: Option<Arc<dyn ReputationLedger>>,
    locks: EntityLocks,
    initialized: AtomicBool,
}

impl AgentRegistry {
    pub fn new(
        config: RegistryConfig,
        agents: Arc<dyn Repository<AgentRecord>>,
        connections: Arc<dyn Repository<ConnectionRecord>>,
        capabilities: Arc<CapabilityLedger>,
    ) -> Self {
        Self {
            config,
            adapters: AdapterTable::new(),
            agents,
            connections,
            capabilities,
            reputation: None,
            locks: EntityLocks::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Registry over isolated in-memory repositories.
    pub fn in_memory(config: RegistryConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryRepository::new()),
            Arc::new(CapabilityLedger::new(Arc::new(MemoryRepository::new()))),
        )
    }

    pub fn with_reputation(mut self, ledger: Arc<dyn ReputationLedger>) -> Self {
        self.reputation = Some(ledger);
        self
    }

    pub fn capabilities(&self) -> &Arc<CapabilityLedger> {
        &self.capabilities
    }

    pub fn reputation(&self) -> Option<&Arc<dyn ReputationLedger>> {
        self.reputation.as_ref()
    }

    pub fn platforms(&self) -> Vec<String> {
        self.adapters.platforms()
    }

    pub async fn initialize(&self) -> Result<(), ApiError> {
        if let Some(ledger) = &self.reputation {
            ledger.initialize().await?;
        }
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(
                platforms = ?self.adapters.platforms(),
                reputation = self.reputation.is_some(),
                "Agent registry initialized"
            );
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_initialized(&self) -> Result<(), ApiError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ApiError::NotInitialized("agent registry"))
        }
    }

    /// Register an adapter under its platform tag. Returns `false` if the tag is
    /// already taken; the first adapter is kept.
    pub fn register_adapter(&self, adapter: Arc<dyn PlatformAdapter>) -> bool {
        self.adapters.register(adapter)
    }

    fn load(&self, agent_id: &str) -> Result<AgentRecord, ApiError> {
        self.agents
            .get(agent_id)?
            .ok_or_else(|| ApiError::not_found("agent", agent_id))
    }

    /// Refresh the record's cached score after a ledger write. The score is
    /// read under the agent lock so the last writer always stores the ledger's
    /// current value.
    async fn cache_score(
        &self,
        ledger: &Arc<dyn ReputationLedger>,
        agent_id: &str,
    ) -> Result<(), ApiError> {
        let _guard = self.locks.lock(agent_id).await;
        if let Some(mut record) = self.agents.get(agent_id)? {
            record.reputation_score = ledger.get_reputation_score(agent_id).await?;
            self.agents.put(agent_id, &record)?;
        }
        Ok(())
    }

    pub async fn create_agent(
        &self,
        platform: &str,
        config: AgentConfig,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        self.ensure_initialized()?;
        validate_agent_config(&config)?;
        let adapter = self.adapters.resolve(platform, ctx).await?;

        let capabilities = config.capabilities.clone();
        let mut record = adapter.create_agent(config, ctx).await?;

        self.capabilities
            .register(&record.id, &capabilities, &BTreeMap::new())?;
        if let Some(ledger) = &self.reputation {
            record.reputation_score = ledger.seed_agent(&record.id).await?.score;
        }
        self.agents.put(&record.id, &record)?;

        info!(
            agent_id = %record.id,
            platform = %record.platform_type,
            capabilities = capabilities.len(),
            "Agent created"
        );
        Ok(record)
    }

    /// Create every member independently; one failure does not abort the rest.
    pub async fn create_agents(
        &self,
        batch: Vec<(String, AgentConfig)>,
        ctx: &CallContext,
    ) -> Vec<Result<AgentRecord, ApiError>> {
        join_all(
            batch
                .into_iter()
                .map(|(platform, config)| async move {
                    self.create_agent(&platform, config, ctx).await
                }),
        )
        .await
    }

    pub async fn run_agent(
        &self,
        agent_id: &str,
        task: Value,
        options: &TaskOptions,
        ctx: &CallContext,
    ) -> Result<TaskResult, ApiError> {
        self.ensure_initialized()?;
        let record = self.load(agent_id)?;
        let adapter = self.adapters.resolve(&record.platform_type, ctx).await?;
        let result = adapter.run_agent(agent_id, task, options, ctx).await?;

        if let Some(ledger) = &self.reputation {
            ledger.record_interaction(agent_id, result.success).await?;
            if result.success {
                let quality = options
                    .quality_score
                    .or(result.quality_score)
                    .unwrap_or(self.config.default_quality_score);
                let rater = options.rater_id.as_deref().unwrap_or(REGISTRY_RATER);
                ledger
                    .submit_rating(
                        agent_id,
                        quality,
                        rater,
                        json!({"source": "run_agent", "completedAt": result.completed_at}),
                    )
                    .await?;
                self.cache_score(ledger, agent_id).await?;
            }
        }

        debug!(agent_id = %agent_id, success = result.success, "Agent task completed");
        Ok(result)
    }

    /// Run every member independently; one failure does not abort the rest.
    pub async fn run_agents(
        &self,
        batch: Vec<TaskRequest>,
        ctx: &CallContext,
    ) -> Vec<Result<TaskResult, ApiError>> {
        join_all(batch.into_iter().map(|request| async move {
            self.run_agent(&request.agent_id, request.task, &request.options, ctx)
                .await
        }))
        .await
    }

    /// Connect two registered agents through the source agent's adapter.
    pub async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
        ctx: &CallContext,
    ) -> Result<ConnectionRecord, ApiError> {
        self.ensure_initialized()?;
        let source = self.load(source_id)?;
        let target = self.load(target_id)?;
        let adapter = self.adapters.resolve(&source.platform_type, ctx).await?;

        let result = adapter
            .connect_agents(source_id, target_id, options, ctx)
            .await?;
        let connection = ConnectionRecord {
            id: result.record_key(),
            source_agent_id: source.id,
            target_agent_id: target.id,
            source_platform: source.platform_type,
            target_platform: target.platform_type,
            status: result.status,
            created_at: crate::types::now(),
        };
        self.connections.put(&connection.id, &connection)?;

        info!(
            connection_id = %connection.id,
            source = %connection.source_agent_id,
            target = %connection.target_agent_id,
            channel = ?result.channel,
            "Agents connected"
        );
        Ok(connection)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord, ApiError> {
        self.ensure_initialized()?;
        self.load(agent_id)
    }

    /// All agents ordered by creation time, then id.
    pub async fn get_all_agents(&self) -> Result<Vec<AgentRecord>, ApiError> {
        self.ensure_initialized()?;
        let mut agents = self.agents.list()?;
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }

    pub async fn update_agent(
        &self,
        agent_id: &str,
        patch: &AgentPatch,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        self.ensure_initialized()?;
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("Agent name cannot be empty".to_string()));
            }
        }
        let platform = self.load(agent_id)?.platform_type;
        let adapter = self.adapters.resolve(&platform, ctx).await?;
        adapter.update_agent(agent_id, patch, ctx).await?;

        let _guard = self.locks.lock(agent_id).await;
        let mut record = self.load(agent_id)?;
        patch.apply(&mut record);
        self.agents.put(agent_id, &record)?;
        Ok(record)
    }

    /// Remove the agent record with its reputation and capability entries.
    /// Connection records referencing the agent are kept.
    pub async fn delete_agent(&self, agent_id: &str, ctx: &CallContext) -> Result<(), ApiError> {
        self.ensure_initialized()?;
        let record = self.load(agent_id)?;

        match self.adapters.resolve(&record.platform_type, ctx).await {
            Ok(adapter) => match adapter.delete_agent(agent_id, ctx).await {
                Ok(_) => {}
                Err(ApiError::UnsupportedOperation { .. }) => {
                    debug!(
                        agent_id = %agent_id,
                        platform = %record.platform_type,
                        "Adapter keeps no deletable state"
                    );
                }
                Err(err) => return Err(err),
            },
            Err(ApiError::NotFound { .. }) => {
                warn!(
                    agent_id = %agent_id,
                    platform = %record.platform_type,
                    "No adapter registered for agent platform; removing local records only"
                );
            }
            Err(err) => return Err(err),
        }

        {
            let _guard = self.locks.lock(agent_id).await;
            self.agents.delete(agent_id)?;
        }
        self.locks.forget(agent_id);
        if let Some(ledger) = &self.reputation {
            ledger.remove_agent(agent_id).await?;
        }
        self.capabilities.remove(agent_id)?;

        info!(agent_id = %agent_id, "Agent deleted");
        Ok(())
    }

    /// All connections ordered by creation time, then id.
    pub async fn get_all_connections(&self) -> Result<Vec<ConnectionRecord>, ApiError> {
        self.ensure_initialized()?;
        let mut connections = self.connections.list()?;
        connections.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(connections)
    }

    pub async fn get_connection(&self, connection_id: &str) -> Result<ConnectionRecord, ApiError> {
        self.ensure_initialized()?;
        self.connections
            .get(connection_id)?
            .ok_or_else(|| ApiError::not_found("connection", connection_id))
    }

    /// Ledger score when a ledger is configured, else the cached score.
    pub async fn get_agent_reputation(&self, agent_id: &str) -> Result<f64, ApiError> {
        self.ensure_initialized()?;
        let record = self.load(agent_id)?;
        match &self.reputation {
            Some(ledger) => ledger.get_reputation_score(agent_id).await,
            None => Ok(record.reputation_score),
        }
    }

    /// Submit a rating for a registered agent and refresh its cached score.
    pub async fn update_agent_reputation(
        &self,
        agent_id: &str,
        rating: f64,
        rater_id: &str,
        evidence: Value,
    ) -> Result<ReputationRecord, ApiError> {
        self.ensure_initialized()?;
        self.load(agent_id)?;
        let ledger = self.reputation.as_ref().ok_or_else(|| {
            ApiError::InvalidState("No reputation ledger is configured".to_string())
        })?;

        let updated = ledger
            .submit_rating(agent_id, rating, rater_id, evidence)
            .await?;
        self.cache_score(ledger, agent_id).await?;
        Ok(updated)
    }

    /// Union tags into the adapter and the capability ledger. Adapters that do
    /// not track capabilities are skipped.
    pub async fn register_capabilities(
        &self,
        agent_id: &str,
        capabilities: &[String],
        metadata: &BTreeMap<String, String>,
        ctx: &CallContext,
    ) -> Result<CapabilityEntry, ApiError> {
        self.ensure_initialized()?;
        let record = self.load(agent_id)?;
        let tags: Vec<String> = capabilities.iter().map(|tag| tag.trim().to_string()).collect();
        let adapter = self.adapters.resolve(&record.platform_type, ctx).await?;
        match adapter.register_capabilities(agent_id, &tags, ctx).await {
            Ok(_) => {}
            Err(ApiError::UnsupportedOperation { .. }) => {
                debug!(
                    agent_id = %agent_id,
                    platform = %record.platform_type,
                    "Adapter does not track capabilities"
                );
            }
            Err(err) => return Err(err),
        }
        self.capabilities.register(agent_id, &tags, metadata)
    }

    /// Count one interaction for a registered agent.
    pub async fn record_interaction(&self, agent_id: &str, success: bool) -> Result<(), ApiError> {
        self.ensure_initialized()?;
        self.load(agent_id)?;
        if let Some(ledger) = &self.reputation {
            ledger.record_interaction(agent_id, success).await?;
        }
        Ok(())
    }
}
