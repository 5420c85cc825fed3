use crate::types::{AgentId, Timestamp};
use serde::{Deserialize, Serialize};

/// One rating in an agent's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    /// Clamped to [0, 1] on submission
    pub rating: f64,
    pub rater_id: String,
    pub timestamp: Timestamp,
    pub weight: f64,
    #[serde(default)]
    pub evidence: serde_json::Value,
}

/// Severity classes for reported violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MinorInfraction,
    MajorInfraction,
    TermsViolation,
    EthicalViolation,
    SecurityBreach,
}

impl ViolationKind {
    /// Score deducted for one violation of this kind.
    pub fn penalty(self) -> f64 {
        match self {
            ViolationKind::MinorInfraction => 0.05,
            ViolationKind::MajorInfraction => 0.15,
            ViolationKind::TermsViolation => 0.25,
            ViolationKind::EthicalViolation => 0.40,
            ViolationKind::SecurityBreach => 0.60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEntry {
    pub kind: ViolationKind,
    pub reporter_id: String,
    pub description: String,
    #[serde(default)]
    pub evidence: serde_json::Value,
    pub timestamp: Timestamp,
    /// Penalty in effect when reported, kept so replays stay stable
    pub penalty: f64,
}

/// Full reputation state for one agent. `score` is always derived from
/// `history` and `violations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRecord {
    pub agent_id: AgentId,
    pub score: f64,
    #[serde(default)]
    pub history: Vec<RatingEntry>,
    #[serde(default)]
    pub violations: Vec<ViolationEntry>,
    #[serde(default)]
    pub total_interactions: u64,
    #[serde(default)]
    pub successful_interactions: u64,
    pub updated_at: Timestamp,
}

impl ReputationRecord {
    pub fn neutral(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            score: crate::agent::NEUTRAL_REPUTATION,
            history: Vec::new(),
            violations: Vec::new(),
            total_interactions: 0,
            successful_interactions: 0,
            updated_at: crate::types::now(),
        }
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.total_interactions == 0 {
            return None;
        }
        Some(self.successful_interactions as f64 / self.total_interactions as f64)
    }
}
