//! Risk tiers and the approval quorum each one demands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered risk classification of an action.
///
/// `Low < Medium < High < Critical`. The tier alone decides how many
/// approvals an action needs; see `ApprovalRequirement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Every tier, lowest first.
    pub const ALL: [RiskTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// The next tier up, saturating at `Critical`.
    pub fn successor(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// The quorum an action must collect before it may execute.
///
/// Satisfied when at least `approvals` APPROVE decisions have been recorded
/// and, if `approver_role` is set, at least one of them came from an actor
/// holding that role. `{ approvals: 0, approver_role: None }` means the
/// action executes autonomously.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovalRequirement {
    pub approvals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_role: Option<String>,
}

impl ApprovalRequirement {
    /// A pure count quorum.
    pub fn count(approvals: u32) -> Self {
        Self { approvals, approver_role: None }
    }

    /// A quorum that additionally needs sign-off from `role`.
    pub fn with_role(approvals: u32, role: impl Into<String>) -> Self {
        Self { approvals, approver_role: Some(role.into()) }
    }

    /// Return true if no human needs to sign off.
    pub fn is_autonomous(&self) -> bool {
        self.approvals == 0 && self.approver_role.is_none()
    }
}

impl fmt::Display for ApprovalRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.approver_role {
            Some(role) => write!(f, "{} approval(s) incl. {}", self.approvals, role),
            None => write!(f, "{} approval(s)", self.approvals),
        }
    }
}
