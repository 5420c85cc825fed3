//! Adapter Contract
//!
//! One [`PlatformAdapter`] per external agent platform. Every operation has a
//! default body that fails with [`ApiError::UnsupportedOperation`], so an
//! adapter opts in to exactly the operations its platform supports and never
//! succeeds silently on the rest.

pub mod bridge;
pub mod client;
pub mod mapping;

use crate::agent::{
    AgentConfig, AgentPatch, AgentRecord, ConnectOptions, ConnectionResult, TaskOptions,
    TaskResult,
};
use crate::cancel::CallContext;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;

pub use self::bridge::BridgeAdapter;
pub use self::client::PlatformClient;
pub use self::mapping::PlatformMapping;

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Routing tag, unique per registry.
    fn platform_type(&self) -> &str;

    async fn initialize(&self, _ctx: &CallContext) -> Result<(), ApiError> {
        Ok(())
    }

    /// Create the agent on the platform, mint its registry id and persist the
    /// mapping between the two.
    async fn create_agent(
        &self,
        _config: AgentConfig,
        _ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "create_agent"))
    }

    async fn run_agent(
        &self,
        _agent_id: &str,
        _task: Value,
        _options: &TaskOptions,
        _ctx: &CallContext,
    ) -> Result<TaskResult, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "run_agent"))
    }

    /// Bridge two agents: shared thread engine, else native channel, else
    /// `InvalidState` naming both ids.
    async fn connect_agents(
        &self,
        _source_id: &str,
        _target_id: &str,
        _options: &ConnectOptions,
        _ctx: &CallContext,
    ) -> Result<ConnectionResult, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "connect_agents"))
    }

    async fn get_agent(&self, _agent_id: &str, _ctx: &CallContext) -> Result<AgentRecord, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "get_agent"))
    }

    async fn get_all_agents(&self, _ctx: &CallContext) -> Result<Vec<AgentRecord>, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "get_all_agents"))
    }

    async fn update_agent(
        &self,
        _agent_id: &str,
        _patch: &AgentPatch,
        _ctx: &CallContext,
    ) -> Result<AgentRecord, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "update_agent"))
    }

    /// Returns whether the adapter held state for the agent.
    async fn delete_agent(&self, _agent_id: &str, _ctx: &CallContext) -> Result<bool, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "delete_agent"))
    }

    async fn register_capabilities(
        &self,
        _agent_id: &str,
        _capabilities: &[String],
        _ctx: &CallContext,
    ) -> Result<BTreeSet<String>, ApiError> {
        Err(ApiError::unsupported(
            self.platform_type(),
            "register_capabilities",
        ))
    }

    async fn has_capability(
        &self,
        _agent_id: &str,
        _capability: &str,
        _ctx: &CallContext,
    ) -> Result<bool, ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "has_capability"))
    }
}
