//! Hash-chain primitives: hashing and chain integrity verification.
//!
//! Every field that contributes to an event's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (bytes, in order):
//!   1. stream id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the entry (serde_json with no pretty-printing)

use sha2::{Digest, Sha256};

use tollgate_contracts::{
    error::{GovernanceError, GovernanceResult},
    execution::AuditEntry,
};

use crate::event::AuditEvent;

/// Compute the SHA-256 hash for a single audit event.
///
/// The hash commits to the event's position in the chain (`sequence`), the
/// stream it belongs to, its link to the previous event (`prev_hash`) and
/// the full entry. Returns a lowercase 64-character hex string.
pub fn hash_event(
    stream: &str,
    sequence: u64,
    entry: &AuditEntry,
    prev_hash: &str,
) -> GovernanceResult<String> {
    let entry_json = serde_json::to_vec(entry).map_err(|e| GovernanceError::AuditWriteFailed {
        reason: format!("audit entry could not be serialized: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(stream.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&entry_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify the integrity of a hash chain.
///
/// Returns `true` when every event links to its predecessor (or to
/// `GENESIS_HASH` for event 0), carries the expected sequence number, and
/// its `this_hash` matches the value recomputed from its own fields. An
/// empty chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for (position, event) in events.iter().enumerate() {
        if event.sequence != position as u64 || event.prev_hash != expected_prev {
            return false;
        }

        match hash_event(&event.stream, event.sequence, &event.entry, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return false,
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
