//! Audit event and log types.
//!
//! `AuditEvent` is a single entry in the hash chain: it wraps an
//! `AuditEntry` (an execution record or a kill switch event) with sequence
//! numbering and the SHA-256 hashes that make tampering detectable.
//! `AuditLog` is the sealed export of a whole stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_contracts::{action::ActionId, execution::AuditEntry};

/// A single entry in the SHA-256 hash chain.
///
/// Modifying any field, including those of the embedded `entry`,
/// invalidates `this_hash` and every subsequent `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,

    /// The audit stream this event belongs to (one per deployment).
    pub stream: String,

    pub entry: AuditEntry,

    /// SHA-256 hash (hex) of the previous event, or `GENESIS_HASH`.
    pub prev_hash: String,

    /// SHA-256 hash (hex) over (stream, sequence, prev_hash, entry JSON).
    pub this_hash: String,
}

impl AuditEvent {
    /// The sentinel `prev_hash` used for the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// The action this event concerns, if it is an execution record.
    pub fn action_id(&self) -> Option<ActionId> {
        match &self.entry {
            AuditEntry::Execution(record) => Some(record.action_id),
            AuditEntry::KillSwitch(_) => None,
        }
    }
}

/// A sealed export of an audit stream.
///
/// The `terminal_hash` is the `this_hash` of the last event and commits to
/// the entire log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub stream: String,

    /// All audit events in chain order (sequence 0 first).
    pub events: Vec<AuditEvent>,

    pub exported_at: DateTime<Utc>,

    /// Empty string if the log is empty.
    pub terminal_hash: String,
}
