//! Cross-platform connection records.

use crate::types::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Active,
    Closed,
    Failed,
}

/// Which primitive an adapter used to bridge two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionChannel {
    /// A thread on the shared thread engine
    Thread,
    /// The platform's own channel primitive
    Native,
}

/// Caller options for `connect_agents`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// What the adapter reports after connecting two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    pub channel: ConnectionChannel,
    pub status: ConnectionStatus,
}

impl ConnectionResult {
    /// Identifier a connection record is keyed by: thread id, then connection id,
    /// then a freshly minted id.
    pub fn record_key(&self) -> String {
        self.thread_id
            .clone()
            .or_else(|| self.connection_id.clone())
            .unwrap_or_else(crate::types::new_id)
    }
}

/// Registry record of a connection. Immutable except `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: String,
    pub source_agent_id: AgentId,
    pub target_agent_id: AgentId,
    pub source_platform: String,
    pub target_platform: String,
    pub status: ConnectionStatus,
    pub created_at: Timestamp,
}
