//! Pending-approval records held by the approval ledger.
//!
//! A `PendingRecord` is created when an action needs human sign-off and is
//! mutated only by the ledger. Callers always receive cloned snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::{Action, Actor},
    tier::{ApprovalRequirement, RiskTier},
};

/// A single approver's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approve,
    Reject,
}

/// One recorded decision on a pending action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub actor: Actor,
    pub verdict: Verdict,
    /// Approval notes or the rejection reason.
    pub note: Option<String>,
    pub decided_at: DateTime<Utc>,
}

/// Lifecycle status of a pending record.
///
/// Only `Pending` accepts decisions. The three other states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl PendingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Whether an approved record has been handed to the executor.
///
/// Leaves `NotStarted` at most once, and only after the record is
/// `Approved`. An approved record still `NotStarted` is deferred work,
/// typically because the kill switch was active when quorum was reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionProgress {
    #[default]
    NotStarted,
    InFlight,
    Executed,
    Failed { reason: String },
}

/// The ledger's view of an action awaiting (or past) human approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub action: Action,
    pub tier: RiskTier,
    pub required_approvals: ApprovalRequirement,
    /// Decisions in the order the ledger accepted them. An actor id appears
    /// at most once.
    pub decisions: Vec<Decision>,
    pub status: PendingStatus,
    pub execution: ExecutionProgress,
    pub registered_at: DateTime<Utc>,
    /// When the record left `Pending`.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingRecord {
    /// Number of APPROVE decisions recorded so far.
    pub fn approval_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.verdict == Verdict::Approve)
            .count()
    }

    /// Return true if `actor_id` has already voted on this record.
    pub fn has_decided(&self, actor_id: &str) -> bool {
        self.decisions.iter().any(|d| d.actor.id == actor_id)
    }

    /// Return true if the record is approved but its execution has not begun.
    pub fn awaiting_execution(&self) -> bool {
        self.status == PendingStatus::Approved && self.execution == ExecutionProgress::NotStarted
    }
}
