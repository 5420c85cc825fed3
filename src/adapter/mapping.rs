use crate::agent::{AgentRecord, NEUTRAL_REPUTATION};
use crate::types::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Adapter-owned link between a registry id and the agent's id on its platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMapping {
    pub agent_id: AgentId,
    pub name: String,
    pub platform_type: String,
    pub platform_id: String,
    /// Tags registered through this adapter; union only
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: Timestamp,
}

impl PlatformMapping {
    pub fn to_record(&self) -> AgentRecord {
        AgentRecord {
            id: self.agent_id.clone(),
            name: self.name.clone(),
            platform_type: self.platform_type.clone(),
            platform_id: self.platform_id.clone(),
            created_at: self.created_at,
            reputation_score: NEUTRAL_REPUTATION,
            metadata: self.metadata.clone(),
        }
    }
}
