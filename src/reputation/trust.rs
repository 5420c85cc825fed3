//! Trust levels and the capability limits they unlock.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Novice,
    Apprentice,
    Trusted,
    Expert,
    Master,
}

impl TrustLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 0.30 {
            TrustLevel::Novice
        } else if score <= 0.50 {
            TrustLevel::Apprentice
        } else if score <= 0.75 {
            TrustLevel::Trusted
        } else if score <= 0.90 {
            TrustLevel::Expert
        } else {
            TrustLevel::Master
        }
    }

    pub fn limits(self) -> CapabilityLimits {
        match self {
            TrustLevel::Novice => CapabilityLimits {
                max_complexity: 3,
                max_transaction_value: Some(100),
                can_access_critical_systems: false,
                can_operate_autonomously: false,
                can_delegate: false,
            },
            TrustLevel::Apprentice => CapabilityLimits {
                max_complexity: 5,
                max_transaction_value: Some(500),
                can_access_critical_systems: false,
                can_operate_autonomously: true,
                can_delegate: false,
            },
            TrustLevel::Trusted => CapabilityLimits {
                max_complexity: 7,
                max_transaction_value: Some(2_000),
                can_access_critical_systems: false,
                can_operate_autonomously: true,
                can_delegate: true,
            },
            TrustLevel::Expert => CapabilityLimits {
                max_complexity: 9,
                max_transaction_value: Some(10_000),
                can_access_critical_systems: true,
                can_operate_autonomously: true,
                can_delegate: true,
            },
            TrustLevel::Master => CapabilityLimits {
                max_complexity: 10,
                max_transaction_value: None,
                can_access_critical_systems: true,
                can_operate_autonomously: true,
                can_delegate: true,
            },
        }
    }
}

/// What an agent at a given trust level may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityLimits {
    /// Highest task complexity accepted, 1..=10
    pub max_complexity: u8,
    /// Transaction ceiling in whole token units; `None` is unlimited
    pub max_transaction_value: Option<u64>,
    pub can_access_critical_systems: bool,
    pub can_operate_autonomously: bool,
    pub can_delegate: bool,
}

/// Actions gated by trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedAction {
    Transaction { value: u64 },
    CriticalAccess,
    AutonomousOperation,
    Delegation,
}

impl CapabilityLimits {
    pub fn permits(&self, action: GatedAction) -> bool {
        match action {
            GatedAction::Transaction { value } => self
                .max_transaction_value
                .map_or(true, |ceiling| value <= ceiling),
            GatedAction::CriticalAccess => self.can_access_critical_systems,
            GatedAction::AutonomousOperation => self.can_operate_autonomously,
            GatedAction::Delegation => self.can_delegate,
        }
    }
}
