//! Agent records and the inputs that create or patch them.

use crate::types::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Neutral reputation every new agent starts from.
pub const NEUTRAL_REPUTATION: f64 = 0.5;

/// Registry-owned record of one agent hosted on some external platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Registry-scoped opaque id, minted by the adapter
    pub id: AgentId,
    pub name: String,
    /// Platform tag used to route calls to an adapter
    pub platform_type: String,
    /// Opaque id of the agent on its own platform
    pub platform_id: String,
    pub created_at: Timestamp,
    /// Cached reputation score in [0, 1]
    #[serde(default = "neutral_reputation")]
    pub reputation_score: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn neutral_reputation() -> f64 {
    NEUTRAL_REPUTATION
}

/// Input to `create_agent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub name: String,
    /// Existing remote id to adopt instead of creating a new remote agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Platform SDK specific settings, passed through untouched
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl AgentConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Partial update for an existing agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Keys merged into the record's metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AgentPatch {
    pub fn apply(&self, record: &mut AgentRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        for (key, value) in &self.metadata {
            record.metadata.insert(key.clone(), value.clone());
        }
    }
}
