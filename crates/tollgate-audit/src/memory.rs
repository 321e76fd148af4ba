//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditSink` keeps every event in a `Vec` behind a mutex, so the
//! engine can append from any thread. Use `export_log()` to obtain a sealed
//! `AuditLog`, and `verify_integrity()` at any time to confirm the chain has
//! not been tampered with in memory.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use tollgate_contracts::{
    action::ActionId,
    error::GovernanceResult,
    execution::{AuditEntry, ExecutionRecord},
};
use tollgate_core::traits::AuditSink;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) sequence: u64,
    /// `GENESIS_HASH` before any event has been written.
    pub(crate) last_hash: String,
}

// ── Public sink ───────────────────────────────────────────────────────────────

/// An in-memory, append-only audit sink backed by a SHA-256 hash chain.
///
/// Cloning the sink shares the underlying chain, so a caller can keep a
/// handle for inspection after boxing a clone into the engine.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    stream: String,
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditSink {
    pub fn new(stream: impl Into<String>) -> Self {
        let state = InMemoryState {
            events: Vec::new(),
            sequence: 0,
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
        };
        Self {
            stream: stream.into(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Export a sealed `AuditLog` containing all events written so far.
    pub fn export_log(&self) -> AuditLog {
        let state = self.state.lock();
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditLog {
            stream: self.stream.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.state.lock().events)
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every execution record in append order.
    pub fn execution_records(&self) -> Vec<ExecutionRecord> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|event| match &event.entry {
                AuditEntry::Execution(record) => Some(record.clone()),
                AuditEntry::KillSwitch(_) => None,
            })
            .collect()
    }

    /// Execution records for one action, in append order.
    pub fn records_for(&self, action_id: ActionId) -> Vec<ExecutionRecord> {
        self.execution_records()
            .into_iter()
            .filter(|record| record.action_id == action_id)
            .collect()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for InMemoryAuditSink {
    /// Append one entry to the hash chain.
    ///
    /// Hashing and linking happen under the same lock, so concurrent appends
    /// still produce a single unbroken chain.
    fn append(&self, entry: &AuditEntry) -> GovernanceResult<()> {
        let mut state = self.state.lock();

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&self.stream, sequence, entry, &prev_hash)?;

        state.events.push(AuditEvent {
            sequence,
            stream: self.stream.clone(),
            entry: entry.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        debug!(stream = %self.stream, sequence, "audit entry appended");
        Ok(())
    }
}
