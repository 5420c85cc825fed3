use crate::types::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};

/// Caller options for `run_agent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOptions {
    /// Rating submitted on success; overrides the result's own quality score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Rater recorded on the automatic rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rater_id: Option<String>,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Outcome of one task executed on a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub agent_id: AgentId,
    pub success: bool,
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: Timestamp,
}

impl TaskResult {
    pub fn succeeded(agent_id: impl Into<AgentId>, output: serde_json::Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: true,
            output,
            quality_score: None,
            error: None,
            completed_at: crate::types::now(),
        }
    }

    pub fn failed(agent_id: impl Into<AgentId>, error: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: false,
            output: serde_json::Value::Null,
            quality_score: None,
            error: Some(error.into()),
            completed_at: crate::types::now(),
        }
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality_score = Some(quality);
        self
    }
}

/// One member of a `run_agents` batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub agent_id: AgentId,
    #[serde(default)]
    pub task: serde_json::Value,
    #[serde(default)]
    pub options: TaskOptions,
}

impl TaskRequest {
    pub fn new(agent_id: impl Into<AgentId>, task: serde_json::Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            task,
            options: TaskOptions::default(),
        }
    }
}

/// Locally logged task behind `record_agent_task` / `get_agent_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub agent_id: AgentId,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub recorded_at: Timestamp,
}
