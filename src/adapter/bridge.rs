//! Generic adapter over a [`PlatformClient`].

use super::client::PlatformClient;
use super::mapping::PlatformMapping;
use super::PlatformAdapter;
use crate::agent::{
    validate_agent_config, validate_capability_tag, AgentConfig, AgentPatch, AgentRecord,
    ConnectOptions, ConnectionChannel, ConnectionResult, ConnectionStatus, TaskOptions,
    TaskResult,
};
use crate::cancel::CallContext;
use crate::concurrency::EntityLocks;
use crate::error::ApiError;
use crate::protocol::{ThreadEngine, ThreadOptions};
use crate::store::{MemoryRepository, Repository};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Implements the whole adapter contract for one platform: registry id minting,
/// mapping persistence, per-agent capability tracking and connect degradation.
pub struct BridgeAdapter<C> {
    client: C,
    mappings: Arc<dyn Repository<PlatformMapping>>,
    threads: Option<Arc<ThreadEngine>>,
    locks: EntityLocks,
}

impl<C: PlatformClient> BridgeAdapter<C> {
    pub fn new(client: C, mappings: Arc<dyn Repository<PlatformMapping>>) -> Self {
        Self {
            client,
            mappings,
            threads: None,
            locks: EntityLocks::new(),
        }
    }

    pub fn in_memory(client: C) -> Self {
        Self::new(client, Arc::new(MemoryRepository::new()))
    }

    /// Connect agents through threads on `engine` instead of native channels.
    pub fn with_thread_engine(mut self, engine: Arc<ThreadEngine>) -> Self {
        self.threads = Some(engine);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mapping for an agent this adapter created.
    pub fn mapping(&self, agent_id: &str) -> Result<PlatformMapping, ApiError> {
        self.mappings
            .get(agent_id)?
            .ok_or_else(|| ApiError::not_found("agent", agent_id))
    }
}

#[async_trait]
impl<C: PlatformClient> PlatformAdapter for BridgeAdapter<C> {
    fn platform_type(&self) -> &str {
        self.client.platform_type()
    }

    async fn initialize(&self, ctx: &CallContext) -> Result<(), ApiError> {
        ctx.run("initialize", self.client.initialize()).await?;
        info!(platform = %self.platform_type(), "Platform adapter initialized");
        Ok(())
    }

    async fn create_agent(
        &self,
        config: AgentConfig,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        validate_agent_config(&config)?;

        let platform_id = match &config.platform_id {
            Some(existing) => existing.clone(),
            None => {
                ctx.run("create_agent", self.client.create_remote_agent(&config))
                    .await?
            }
        };

        let mapping = PlatformMapping {
            agent_id: crate::types::new_id(),
            name: config.name.trim().to_string(),
            platform_type: self.platform_type().to_string(),
            platform_id,
            capabilities: config.capabilities.iter().cloned().collect(),
            metadata: config.metadata.clone(),
            created_at: crate::types::now(),
        };
        self.mappings.put(&mapping.agent_id, &mapping)?;

        debug!(
            platform = %mapping.platform_type,
            agent_id = %mapping.agent_id,
            platform_id = %mapping.platform_id,
            "Mapped platform agent"
        );
        Ok(mapping.to_record())
    }

    async fn run_agent(
        &self,
        agent_id: &str,
        task: Value,
        options: &TaskOptions,
        ctx: &CallContext,
    ) -> Result<TaskResult, ApiError> {
        let mapping = self.mapping(agent_id)?;
        let mut result = ctx
            .run(
                "run_agent",
                self.client.execute_task(&mapping.platform_id, &task, options),
            )
            .await?;
        result.agent_id = agent_id.to_string();
        Ok(result)
    }

    async fn connect_agents(
        &self,
        source_id: &str,
        target_id: &str,
        options: &ConnectOptions,
        ctx: &CallContext,
    ) -> Result<ConnectionResult, ApiError> {
        ctx.check("connect_agents")?;
        let source = self.mapping(source_id)?;

        if let Some(engine) = &self.threads {
            let title = options
                .title
                .clone()
                .unwrap_or_else(|| format!("{} <> {}", source_id, target_id));
            let thread_options = ThreadOptions {
                title,
                participants: vec![source_id.to_string(), target_id.to_string()],
                metadata: options.metadata.clone(),
            };
            let thread = ctx
                .run("connect_agents", engine.create_thread(thread_options))
                .await?;
            return Ok(ConnectionResult {
                thread_id: Some(thread.id),
                connection_id: None,
                channel: ConnectionChannel::Thread,
                status: ConnectionStatus::Active,
            });
        }

        let target = self
            .mappings
            .get(target_id)?
            .map(|mapping| mapping.platform_id)
            .unwrap_or_else(|| target_id.to_string());
        let channel = ctx
            .run(
                "connect_agents",
                self.client.open_channel(&source.platform_id, &target),
            )
            .await?;

        match channel {
            Some(connection_id) => Ok(ConnectionResult {
                thread_id: None,
                connection_id: Some(connection_id),
                channel: ConnectionChannel::Native,
                status: ConnectionStatus::Active,
            }),
            None => Err(ApiError::InvalidState(format!(
                "Platform '{}' has no way to connect {} and {}",
                self.platform_type(),
                source_id,
                target_id
            ))),
        }
    }

    async fn get_agent(&self, agent_id: &str, _ctx: &CallContext) -> Result<AgentRecord, ApiError> {
        Ok(self.mapping(agent_id)?.to_record())
    }

    async fn get_all_agents(&self, _ctx: &CallContext) -> Result<Vec<AgentRecord>, ApiError> {
        let mut records: Vec<AgentRecord> = self
            .mappings
            .list()?
            .iter()
            .map(PlatformMapping::to_record)
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn update_agent(
        &self,
        agent_id: &str,
        patch: &AgentPatch,
        ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        let _guard = self.locks.lock(agent_id).await;
        let mut mapping = self.mapping(agent_id)?;
        ctx.run(
            "update_agent",
            self.client.update_remote_agent(&mapping.platform_id, patch),
        )
        .await?;

        if let Some(name) = &patch.name {
            mapping.name = name.clone();
        }
        mapping.metadata.extend(patch.metadata.clone());
        self.mappings.put(agent_id, &mapping)?;
        Ok(mapping.to_record())
    }

    async fn delete_agent(&self, agent_id: &str, ctx: &CallContext) -> Result<bool, ApiError> {
        let removed = {
            let _guard = self.locks.lock(agent_id).await;
            let Some(mapping) = self.mappings.get(agent_id)? else {
                return Ok(false);
            };
            ctx.run(
                "delete_agent",
                self.client.delete_remote_agent(&mapping.platform_id),
            )
            .await?;
            self.mappings.delete(agent_id)?
        };
        self.locks.forget(agent_id);
        Ok(removed)
    }

    async fn register_capabilities(
        &self,
        agent_id: &str,
        capabilities: &[String],
        _ctx: &CallContext,
    ) -> Result<BTreeSet<String>, ApiError> {
        for tag in capabilities {
            validate_capability_tag(tag)?;
        }
        let _guard = self.locks.lock(agent_id).await;
        let mut mapping = self.mapping(agent_id)?;
        mapping.capabilities.extend(capabilities.iter().cloned());
        self.mappings.put(agent_id, &mapping)?;
        Ok(mapping.capabilities)
    }

    async fn has_capability(
        &self,
        agent_id: &str,
        capability: &str,
        _ctx: &CallContext,
    ) -> Result<bool, ApiError> {
        Ok(self.mapping(agent_id)?.capabilities.contains(capability))
    }
}
