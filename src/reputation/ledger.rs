//! Repository-backed reputation ledger.

use super::record::{RatingEntry, ReputationRecord, ViolationEntry, ViolationKind};
use super::score::{clamp_rating, compute_score, RaterWeighting, UniformWeighting};
use super::trust::{CapabilityLimits, TrustLevel};
use super::ReputationLedger;
use crate::agent::NEUTRAL_REPUTATION;
use crate::concurrency::EntityLocks;
use crate::error::ApiError;
use crate::store::Repository;
use crate::types::{AgentId, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest window chrono can represent in seconds.
const MAX_WINDOW_SECS: u64 = (i64::MAX / 1_000) as u64;

/// Ledger tuning loaded from the `reputation` config section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Only ratings this many seconds older than the newest one count.
    /// `None` keeps the full history.
    #[serde(default)]
    pub rating_window_secs: Option<u64>,
}

impl ReputationConfig {
    fn window(&self) -> Option<chrono::Duration> {
        self.rating_window_secs
            .map(|secs| chrono::Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64))
    }
}

/// Portable summary of an agent's standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationSnapshot {
    pub agent_id: AgentId,
    pub score: f64,
    pub total_ratings: usize,
    pub total_interactions: u64,
    pub successful_interactions: u64,
    pub violation_count: usize,
    pub trust_level: TrustLevel,
    pub capability_limits: CapabilityLimits,
    pub exported_at: Timestamp,
}

pub struct HistoryReputationLedger {
    repository: Arc<dyn Repository<ReputationRecord>>,
    locks: EntityLocks,
    weighting: Arc<dyn RaterWeighting>,
    config: ReputationConfig,
    initialized: AtomicBool,
}

impl HistoryReputationLedger {
    pub fn new(repository: Arc<dyn Repository<ReputationRecord>>, config: ReputationConfig) -> Self {
        Self {
            repository,
            locks: EntityLocks::new(),
            weighting: Arc::new(UniformWeighting),
            config,
            initialized: AtomicBool::new(false),
        }
    }

    /// Replace the per-rater weighting hook.
    pub fn with_weighting(mut self, weighting: Arc<dyn RaterWeighting>) -> Self {
        self.weighting = weighting;
        self
    }

    fn ensure_initialized(&self) -> Result<(), ApiError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ApiError::NotInitialized("reputation ledger"))
        }
    }

    /// Read-modify-write one record under its entity lock, recomputing the score.
    async fn update<F>(&self, agent_id: &str, mutate: F) -> Result<ReputationRecord, ApiError>
    where
        F: FnOnce(&mut ReputationRecord) + Send,
    {
        self.ensure_initialized()?;
        let _guard = self.locks.lock(agent_id).await;

        let mut record = self
            .repository
            .get(agent_id)?
            .unwrap_or_else(|| ReputationRecord::neutral(agent_id));
        mutate(&mut record);
        record.score = compute_score(&record.history, &record.violations, self.config.window());
        record.updated_at = crate::types::now();
        self.repository.put(agent_id, &record)?;
        Ok(record)
    }

    /// Export the agent's current standing. Unknown agents export as neutral.
    pub async fn export_snapshot(&self, agent_id: &str) -> Result<ReputationSnapshot, ApiError> {
        self.ensure_initialized()?;
        let record = self
            .repository
            .get(agent_id)?
            .unwrap_or_else(|| ReputationRecord::neutral(agent_id));
        let trust_level = TrustLevel::from_score(record.score);

        Ok(ReputationSnapshot {
            agent_id: record.agent_id,
            score: record.score,
            total_ratings: record.history.len(),
            total_interactions: record.total_interactions,
            successful_interactions: record.successful_interactions,
            violation_count: record.violations.len(),
            trust_level,
            capability_limits: trust_level.limits(),
            exported_at: crate::types::now(),
        })
    }
}

#[async_trait]
impl ReputationLedger for HistoryReputationLedger {
    async fn initialize(&self) -> Result<(), ApiError> {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(
                window_secs = ?self.config.rating_window_secs,
                "Reputation ledger initialized"
            );
        }
        Ok(())
    }

    async fn seed_agent(&self, agent_id: &str) -> Result<ReputationRecord, ApiError> {
        self.ensure_initialized()?;
        let _guard = self.locks.lock(agent_id).await;
        if let Some(existing) = self.repository.get(agent_id)? {
            return Ok(existing);
        }
        let record = ReputationRecord::neutral(agent_id);
        self.repository.put(agent_id, &record)?;
        debug!(agent_id = %agent_id, score = NEUTRAL_REPUTATION, "Seeded reputation");
        Ok(record)
    }

    async fn submit_rating(
        &self,
        agent_id: &str,
        rating: f64,
        rater_id: &str,
        evidence: serde_json::Value,
    ) -> Result<ReputationRecord, ApiError> {
        let clamped = clamp_rating(rating);
        if clamped != rating {
            debug!(agent_id = %agent_id, rating, clamped, "Clamped out-of-range rating");
        }
        let entry = RatingEntry {
            rating: clamped,
            rater_id: rater_id.to_string(),
            timestamp: crate::types::now(),
            weight: self.weighting.weight(rater_id),
            evidence,
        };

        let record = self
            .update(agent_id, move |record| record.history.push(entry))
            .await?;
        debug!(
            agent_id = %agent_id,
            rater_id = %rater_id,
            score = record.score,
            ratings = record.history.len(),
            "Rating submitted"
        );
        Ok(record)
    }

    async fn get_reputation_score(&self, agent_id: &str) -> Result<f64, ApiError> {
        self.ensure_initialized()?;
        Ok(self
            .repository
            .get(agent_id)?
            .map(|record| record.score)
            .unwrap_or(NEUTRAL_REPUTATION))
    }

    async fn get_reputation_history(&self, agent_id: &str) -> Result<Vec<RatingEntry>, ApiError> {
        self.ensure_initialized()?;
        Ok(self
            .repository
            .get(agent_id)?
            .map(|record| record.history)
            .unwrap_or_default())
    }

    async fn get_record(&self, agent_id: &str) -> Result<Option<ReputationRecord>, ApiError> {
        self.ensure_initialized()?;
        Ok(self.repository.get(agent_id)?)
    }

    async fn record_interaction(
        &self,
        agent_id: &str,
        success: bool,
    ) -> Result<ReputationRecord, ApiError> {
        self.update(agent_id, |record| {
            record.total_interactions += 1;
            if success {
                record.successful_interactions += 1;
            }
        })
        .await
    }

    async fn report_violation(
        &self,
        agent_id: &str,
        kind: ViolationKind,
        reporter_id: &str,
        description: &str,
        evidence: serde_json::Value,
    ) -> Result<ReputationRecord, ApiError> {
        let entry = ViolationEntry {
            kind,
            reporter_id: reporter_id.to_string(),
            description: description.to_string(),
            evidence,
            timestamp: crate::types::now(),
            penalty: kind.penalty(),
        };
        let record = self
            .update(agent_id, move |record| record.violations.push(entry))
            .await?;
        warn!(
            agent_id = %agent_id,
            reporter_id = %reporter_id,
            kind = ?kind,
            score = record.score,
            "Violation reported"
        );
        Ok(record)
    }

    async fn remove_agent(&self, agent_id: &str) -> Result<bool, ApiError> {
        self.ensure_initialized()?;
        let removed = {
            let _guard = self.locks.lock(agent_id).await;
            self.repository.delete(agent_id)?
        };
        self.locks.forget(agent_id);
        Ok(removed)
    }
}
