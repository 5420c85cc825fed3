//! Platform SDK seam.
//!
//! A [`PlatformClient`] is the thin layer over one platform's own SDK. It speaks
//! in platform ids only; [`super::BridgeAdapter`] owns the registry ids and the
//! mapping between the two.

use crate::agent::{AgentConfig, AgentPatch, TaskOptions, TaskResult};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform_type(&self) -> &str;

    async fn initialize(&self) -> Result<(), ApiError> {
        Ok(())
    }

    /// Create the agent on the platform and return its platform id.
    async fn create_remote_agent(&self, config: &AgentConfig) -> Result<String, ApiError>;

    /// Execute a task. The returned result's `agent_id` is replaced with the
    /// registry id by the adapter.
    async fn execute_task(
        &self,
        platform_id: &str,
        task: &Value,
        options: &TaskOptions,
    ) -> Result<TaskResult, ApiError>;

    /// Open a native channel between two agents, returning its id.
    ///
    /// `target` is the target's platform id when this platform hosts it, and
    /// its registry id otherwise. `None` means the platform has no channel
    /// primitive.
    async fn open_channel(
        &self,
        _source_platform_id: &str,
        _target: &str,
    ) -> Result<Option<String>, ApiError> {
        Ok(None)
    }

    async fn update_remote_agent(
        &self,
        _platform_id: &str,
        _patch: &AgentPatch,
    ) -> Result<(), ApiError> {
        Err(ApiError::unsupported(self.platform_type(), "update_agent"))
    }

    async fn delete_remote_agent(&self, _platform_id: &str) -> Result<(), ApiError> {
        Ok(())
    }
}
