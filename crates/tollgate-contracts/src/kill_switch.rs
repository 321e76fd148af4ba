//! Kill switch state and the events emitted when it is toggled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the process-wide kill switch.
///
/// `reason`, `activated_by` and `activated_at` are present iff `active`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KillSwitchState {
    pub active: bool,
    pub reason: Option<String>,
    pub activated_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl KillSwitchState {
    /// The state of a switch that has never been thrown.
    pub fn inactive() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KillSwitchEventKind {
    Activated,
    Deactivated,
}

/// One activate or deactivate call, written to the audit trail.
///
/// Emitted even for idempotent calls (re-activation, deactivating an
/// inactive switch) so every attempt is traceable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchEvent {
    pub kind: KillSwitchEventKind,
    /// The operator who toggled the switch.
    pub actor: String,
    /// Activation reason, or the operator's notes on deactivation.
    pub reason: Option<String>,
    /// Whether the switch was active before this call.
    pub was_active: bool,
    /// Executions admitted before this call that had not yet finished.
    pub in_flight: usize,
    pub at: DateTime<Utc>,
}
