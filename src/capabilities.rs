//! Capability Ledger
//!
//! Per-agent set of capability tags. Sets grow by union only: registering tags
//! never removes ones already present, and the only way an entry disappears is
//! deleting the agent.

use crate::agent::validate_capability_tag;
use crate::error::ApiError;
use crate::store::Repository;
use crate::types::{AgentId, Timestamp};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityEntry {
    pub agent_id: AgentId,
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub updated_at: Timestamp,
}

impl CapabilityEntry {
    /// Superset check plus exact key/value filter match against metadata.
    /// An empty requirement matches every entry.
    pub fn matches(&self, required: &[String], filters: &BTreeMap<String, String>) -> bool {
        required.iter().all(|tag| self.capabilities.contains(tag))
            && filters
                .iter()
                .all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}

pub struct CapabilityLedger {
    repository: Arc<dyn Repository<CapabilityEntry>>,
    /// Serializes read-modify-write unions
    write_lock: Mutex<()>,
}

impl CapabilityLedger {
    pub fn new(repository: Arc<dyn Repository<CapabilityEntry>>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    /// Union `tags` into the agent's set and merge `metadata`.
    pub fn register<I, S>(
        &self,
        agent_id: &str,
        tags: I,
        metadata: &BTreeMap<String, String>,
    ) -> Result<CapabilityEntry, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: Vec<String> = tags.into_iter().map(|t| t.as_ref().trim().to_string()).collect();
        for tag in &tags {
            validate_capability_tag(tag)?;
        }

        let _guard = self.write_lock.lock();
        let mut entry = self
            .repository
            .get(agent_id)?
            .unwrap_or_else(|| CapabilityEntry {
                agent_id: agent_id.to_string(),
                capabilities: BTreeSet::new(),
                metadata: BTreeMap::new(),
                updated_at: crate::types::now(),
            });

        let before = entry.capabilities.len();
        entry.capabilities.extend(tags);
        for (key, value) in metadata {
            entry.metadata.insert(key.clone(), value.clone());
        }
        entry.updated_at = crate::types::now();
        self.repository.put(agent_id, &entry)?;

        debug!(
            agent_id = %agent_id,
            added = entry.capabilities.len() - before,
            total = entry.capabilities.len(),
            "Registered capabilities"
        );
        Ok(entry)
    }

    pub fn get(&self, agent_id: &str) -> Result<Option<CapabilityEntry>, ApiError> {
        Ok(self.repository.get(agent_id)?)
    }

    /// The agent's tags; empty when it has never registered any.
    pub fn capabilities(&self, agent_id: &str) -> Result<BTreeSet<String>, ApiError> {
        Ok(self
            .repository
            .get(agent_id)?
            .map(|entry| entry.capabilities)
            .unwrap_or_default())
    }

    pub fn has_capability(&self, agent_id: &str, tag: &str) -> Result<bool, ApiError> {
        Ok(self.capabilities(agent_id)?.contains(tag))
    }

    pub fn entries(&self) -> Result<Vec<CapabilityEntry>, ApiError> {
        Ok(self.repository.list()?)
    }

    pub fn remove(&self, agent_id: &str) -> Result<bool, ApiError> {
        let _guard = self.write_lock.lock();
        Ok(self.repository.delete(agent_id)?)
    }
}
