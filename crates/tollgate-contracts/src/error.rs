//! Error types for the Tollgate governance engine.
//!
//! All fallible operations return `GovernanceResult<T>`. A kill-switch block
//! is deliberately absent: it is a `Disposition`, not an error.

use thiserror::Error;

use crate::{action::ActionId, approval::PendingStatus};

/// The unified error type for Tollgate.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// The proposal is malformed. The caller must fix it and re-propose.
    #[error("invalid action: {reason}")]
    InvalidAction { reason: String },

    /// No classification rule exists for the action kind. An operator must
    /// add one; the engine never falls back to a default tier.
    #[error("unknown action kind '{kind}': no classification rule configured")]
    UnknownActionKind { kind: String },

    /// The action id has already been proposed.
    #[error("action {action_id} has already been proposed")]
    DuplicateAction { action_id: ActionId },

    /// No pending record exists for the action id.
    #[error("no pending record for action {action_id}")]
    UnknownAction { action_id: ActionId },

    /// The record already reached a terminal status.
    #[error("action {action_id} is already {status}")]
    TerminalAction {
        action_id: ActionId,
        status: PendingStatus,
    },

    /// The actor has already voted on this action.
    #[error("'{actor}' has already decided on action {action_id}")]
    AlreadyDecided { action_id: ActionId, actor: String },

    /// The executor failed. Not retried internally; re-propose under a new id.
    #[error("execution of action {action_id} failed: {reason}")]
    ExecutionFailed { action_id: ActionId, reason: String },

    /// The actor may not perform this operation.
    #[error("'{actor}' is not authorized to {operation}")]
    Unauthorized { actor: String, operation: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The audit sink could not persist an entry.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// The notification sink could not deliver an event.
    #[error("notification failed: {reason}")]
    NotificationFailed { reason: String },
}

/// Convenience alias used throughout the Tollgate crates.
pub type GovernanceResult<T> = Result<T, GovernanceError>;
