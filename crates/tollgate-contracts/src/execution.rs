//! Dispositions, execution records and the entries sent to external sinks.
//!
//! `Disposition` is what the engine returns to the proposing agent.
//! `ExecutionRecord` is what gets written to the audit sink: one per action,
//! at its terminal disposition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionId, ActionKind},
    approval::PendingRecord,
    kill_switch::KillSwitchEvent,
    tier::{ApprovalRequirement, RiskTier},
};

/// How an action reached its terminal disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    /// Executed without human sign-off.
    Autonomous,
    /// Executed after reaching quorum.
    Approved,
    /// Rejected by an approver. Never executed.
    Rejected,
    /// Refused at proposal time because the kill switch was active.
    BlockedByKillSwitch,
    /// Expired while still pending.
    Expired,
}

/// An immutable audit entry, written exactly once per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub tier: RiskTier,
    pub execution_type: ExecutionType,
    /// The approver whose decision produced this disposition, if any.
    pub decided_by: Option<String>,
    /// Free-form context: the kill switch reason, a rejection note, etc.
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// The outcome of proposing an action.
///
/// Callers pattern-match on this:
/// - `Executed` → the executor ran; the audit record is attached
/// - `AwaitingApproval` → notify approvers; the action is in `list_pending()`
/// - `Blocked` → the kill switch is active; surface the reason, do not retry
///
/// Every variant carries the classifier's `rationale` for the tier, e.g.
/// "PURCHASE_ORDER 300000 usd exceeds the MEDIUM limit of 200000".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum Disposition {
    Executed {
        action_id: ActionId,
        tier: RiskTier,
        required_approvals: ApprovalRequirement,
        rationale: String,
        record: ExecutionRecord,
        /// Whatever the executor reported back.
        outcome: serde_json::Value,
    },
    AwaitingApproval {
        action_id: ActionId,
        tier: RiskTier,
        required_approvals: ApprovalRequirement,
        rationale: String,
    },
    Blocked {
        action_id: ActionId,
        tier: RiskTier,
        required_approvals: ApprovalRequirement,
        rationale: String,
        /// The kill switch activation reason.
        reason: String,
        activated_by: String,
        activated_at: DateTime<Utc>,
    },
}

impl Disposition {
    pub fn action_id(&self) -> ActionId {
        match self {
            Self::Executed { action_id, .. }
            | Self::AwaitingApproval { action_id, .. }
            | Self::Blocked { action_id, .. } => *action_id,
        }
    }

    pub fn tier(&self) -> RiskTier {
        match self {
            Self::Executed { tier, .. }
            | Self::AwaitingApproval { tier, .. }
            | Self::Blocked { tier, .. } => *tier,
        }
    }

    pub fn required_approvals(&self) -> &ApprovalRequirement {
        match self {
            Self::Executed { required_approvals, .. }
            | Self::AwaitingApproval { required_approvals, .. }
            | Self::Blocked { required_approvals, .. } => required_approvals,
        }
    }

    /// Why the action landed in its tier.
    pub fn rationale(&self) -> &str {
        match self {
            Self::Executed { rationale, .. }
            | Self::AwaitingApproval { rationale, .. }
            | Self::Blocked { rationale, .. } => rationale,
        }
    }
}

/// Everything the audit sink is asked to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum AuditEntry {
    Execution(ExecutionRecord),
    KillSwitch(KillSwitchEvent),
}

/// Everything published to real-time observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Execution(ExecutionRecord),
    Pending(PendingRecord),
    KillSwitch(KillSwitchEvent),
}
