//! Collaborator traits at the edge of the governance engine.
//!
//! - `RiskClassifier`   — trusted, pure: (kind, magnitude) → tier → quorum, rationale
//! - `PayloadVerifier`  — trusted, pure: structural checks on the payload
//! - `ActionExecutor`   — external: performs the real-world side effect
//! - `AuditSink`        — external: durable, append-only record
//! - `NotificationSink` — external, best-effort: real-time observers
//!
//! The engine wires them together. `ActionExecutor::execute` is never called
//! twice for the same action id.

use tollgate_contracts::{
    action::{Action, ActionKind},
    error::GovernanceResult,
    execution::{AuditEntry, Notification},
    tier::{ApprovalRequirement, RiskTier},
};

/// Maps a proposed action to its risk tier and approval quorum.
///
/// Implementations must be deterministic and total over configured kinds.
/// An unconfigured kind is `GovernanceError::UnknownActionKind`, never a
/// silently chosen default tier.
pub trait RiskClassifier: Send + Sync {
    /// Classify `magnitude` for `kind`.
    fn classify(&self, kind: &ActionKind, magnitude: f64) -> GovernanceResult<RiskTier>;

    /// The quorum an action of `kind` at `tier` must reach before it may
    /// execute. Kinds may name their own approver roles.
    fn requirement(&self, kind: &ActionKind, tier: RiskTier) -> ApprovalRequirement;

    /// A human-readable reason for `tier`, shown to approvers.
    fn explain(&self, kind: &ActionKind, magnitude: f64, tier: RiskTier) -> String {
        format!("{} of magnitude {} classified {}", kind, magnitude, tier)
    }
}

/// Structural validation of an action payload before classification.
///
/// A failing check surfaces as `GovernanceError::InvalidAction` and nothing
/// is recorded for the action.
pub trait PayloadVerifier: Send + Sync {
    /// Return the list of violations; empty means the payload is acceptable.
    fn verify(&self, kind: &ActionKind, payload: &serde_json::Value) -> Vec<String>;
}

/// Performs an action in the real world (places the order, sends the SMS).
///
/// Called with no governance lock held; may block on I/O.
pub trait ActionExecutor: Send + Sync {
    /// Execute `action`, returning an executor-defined result on success.
    ///
    /// Errors are surfaced to the caller as `ExecutionFailed` and are never
    /// retried by the engine.
    fn execute(&self, action: &Action) -> GovernanceResult<serde_json::Value>;
}

/// The audit sink: the durable record of every disposition.
///
/// A failed append is logged at warn level but does not roll back the
/// governance decision.
pub trait AuditSink: Send + Sync {
    /// Append one entry. Implementations must treat this as append-only.
    fn append(&self, entry: &AuditEntry) -> GovernanceResult<()>;
}

/// Best-effort fan-out to dashboards and other live observers.
pub trait NotificationSink: Send + Sync {
    /// Publish one notification. Failures are swallowed by the engine.
    fn publish(&self, notification: &Notification) -> GovernanceResult<()>;
}

/// A notification sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn publish(&self, _notification: &Notification) -> GovernanceResult<()> {
        Ok(())
    }
}
