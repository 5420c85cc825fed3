//! Reputation Ledger
//!
//! Per-agent score plus the rating history it is derived from. The registry and
//! discovery service consume the ledger through the [`ReputationLedger`] trait;
//! [`HistoryReputationLedger`] is the repository-backed implementation.

pub mod ledger;
pub mod record;
pub mod score;
pub mod trust;

use crate::error::ApiError;
use async_trait::async_trait;

pub use self::ledger::{HistoryReputationLedger, ReputationConfig, ReputationSnapshot};
pub use self::record::{RatingEntry, ReputationRecord, ViolationEntry, ViolationKind};
pub use self::score::{compute_score, RaterWeighting, UniformWeighting};
pub use self::trust::{CapabilityLimits, GatedAction, TrustLevel};

#[async_trait]
pub trait ReputationLedger: Send + Sync {
    async fn initialize(&self) -> Result<(), ApiError>;

    /// Create a neutral record if none exists. Idempotent.
    async fn seed_agent(&self, agent_id: &str) -> Result<ReputationRecord, ApiError>;

    /// Append a rating and recompute the score from the full history.
    async fn submit_rating(
        &self,
        agent_id: &str,
        rating: f64,
        rater_id: &str,
        evidence: serde_json::Value,
    ) -> Result<ReputationRecord, ApiError>;

    /// Current score; unknown agents are neutral.
    async fn get_reputation_score(&self, agent_id: &str) -> Result<f64, ApiError>;

    async fn get_reputation_history(&self, agent_id: &str) -> Result<Vec<RatingEntry>, ApiError>;

    async fn verify_agent_reputation(
        &self,
        agent_id: &str,
        threshold: f64,
    ) -> Result<bool, ApiError> {
        Ok(self.get_reputation_score(agent_id).await? >= threshold)
    }

    async fn get_record(&self, agent_id: &str) -> Result<Option<ReputationRecord>, ApiError>;

    /// Count one interaction without submitting a rating.
    async fn record_interaction(
        &self,
        agent_id: &str,
        success: bool,
    ) -> Result<ReputationRecord, ApiError>;

    async fn report_violation(
        &self,
        agent_id: &str,
        kind: ViolationKind,
        reporter_id: &str,
        description: &str,
        evidence: serde_json::Value,
    ) -> Result<ReputationRecord, ApiError>;

    /// Returns whether a record existed.
    async fn remove_agent(&self, agent_id: &str) -> Result<bool, ApiError>;

    async fn trust_level(&self, agent_id: &str) -> Result<TrustLevel, ApiError> {
        Ok(TrustLevel::from_score(
            self.get_reputation_score(agent_id).await?,
        ))
    }

    async fn can_perform_action(
        &self,
        agent_id: &str,
        action: GatedAction,
    ) -> Result<bool, ApiError> {
        Ok(self.trust_level(agent_id).await?.limits().permits(action))
    }
}
