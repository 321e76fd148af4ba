//! # tollgate-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for the Tollgate runtime,
//! plus a bounded activity feed for live dashboards.
//!
//! ## Overview
//!
//! Every disposition and kill switch toggle the engine records is wrapped in
//! an `AuditEvent` that links to the previous event via its SHA-256 hash.
//! Tampering with any event breaks the chain and is detected by
//! `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_audit::{ActivityFeed, InMemoryAuditSink};
//!
//! let audit = InMemoryAuditSink::new("st-marys-governance");
//! let engine = GovernanceEngine::new(classifier, executor, Box::new(audit.clone()))
//!     .with_notifier(Box::new(ActivityFeed::new()));
//!
//! assert!(audit.verify_integrity());
//! let log = audit.export_log();
//! ```

pub mod chain;
pub mod event;
pub mod history;
pub mod memory;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use history::ActivityFeed;
pub use memory::InMemoryAuditSink;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::Utc;

    use tollgate_contracts::{
        action::{ActionId, ActionKind},
        execution::{AuditEntry, ExecutionRecord, ExecutionType, Notification},
        kill_switch::{KillSwitchEvent, KillSwitchEventKind},
        tier::RiskTier,
    };
    use tollgate_core::traits::{AuditSink, NotificationSink};

    use super::{ActivityFeed, AuditEvent, InMemoryAuditSink};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(execution_type: ExecutionType, detail: &str) -> ExecutionRecord {
        ExecutionRecord {
            action_id: ActionId::new(),
            kind: ActionKind::PurchaseOrder,
            tier: RiskTier::Low,
            execution_type,
            decided_by: None,
            detail: Some(detail.to_string()),
            recorded_at: Utc::now(),
        }
    }

    fn entry(detail: &str) -> AuditEntry {
        AuditEntry::Execution(make_record(ExecutionType::Autonomous, detail))
    }

    fn kill_switch_entry() -> AuditEntry {
        AuditEntry::KillSwitch(KillSwitchEvent {
            kind: KillSwitchEventKind::Activated,
            actor: "ops-lead".to_string(),
            reason: Some("drill".to_string()),
            was_active: false,
            in_flight: 0,
            at: Utc::now(),
        })
    }

    // ── Hash chain ────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_chain_integrity() {
        let sink = InMemoryAuditSink::new("stream-integrity");
        sink.append(&entry("first")).unwrap();
        sink.append(&kill_switch_entry()).unwrap();
        sink.append(&entry("third")).unwrap();

        assert!(sink.verify_integrity(), "chain must be valid after sequential appends");
        assert_eq!(sink.len(), 3);
    }

    /// Mutating any stored entry breaks the chain.
    #[test]
    fn test_tamper_detection() {
        let sink = InMemoryAuditSink::new("stream-tamper");
        sink.append(&entry("step-a")).unwrap();
        sink.append(&entry("step-b")).unwrap();
        sink.append(&entry("step-c")).unwrap();

        {
            let mut state = sink.state.lock();
            if let AuditEntry::Execution(record) = &mut state.events[0].entry {
                record.execution_type = ExecutionType::Approved;
            }
        }

        assert!(!sink.verify_integrity(), "chain must detect tampering with a stored event");
    }

    /// Dropping an event from the middle is detected too.
    #[test]
    fn test_deletion_detection() {
        let sink = InMemoryAuditSink::new("stream-delete");
        sink.append(&entry("a")).unwrap();
        sink.append(&entry("b")).unwrap();
        sink.append(&entry("c")).unwrap();

        let mut log = sink.export_log();
        log.events.remove(1);
        assert!(!super::verify_chain(&log.events));
    }

    #[test]
    fn test_genesis_hash_and_sequence() {
        let sink = InMemoryAuditSink::new("stream-genesis");
        sink.append(&entry("a")).unwrap();
        sink.append(&entry("b")).unwrap();

        let log = sink.export_log();
        assert_eq!(log.events[0].prev_hash, AuditEvent::GENESIS_HASH);
        for (idx, event) in log.events.iter().enumerate() {
            assert_eq!(event.sequence, idx as u64);
        }
        assert_eq!(log.events[1].prev_hash, log.events[0].this_hash);
    }

    #[test]
    fn test_export_log() {
        let sink = InMemoryAuditSink::new("stream-export");
        sink.append(&entry("alpha")).unwrap();
        sink.append(&entry("beta")).unwrap();

        let log = sink.export_log();
        assert_eq!(log.stream, "stream-export");
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.terminal_hash, log.events.last().unwrap().this_hash);
        assert!(super::verify_chain(&log.events));
    }

    #[test]
    fn test_verify_empty() {
        let sink = InMemoryAuditSink::new("stream-empty");
        assert!(sink.verify_integrity(), "an empty chain must be considered valid");
        assert!(sink.is_empty());
        assert_eq!(sink.export_log().terminal_hash, "");
    }

    #[test]
    fn test_records_for_filters_by_action() {
        let sink = InMemoryAuditSink::new("stream-filter");
        let target = make_record(ExecutionType::BlockedByKillSwitch, "blocked");
        let id = target.action_id;
        sink.append(&entry("other")).unwrap();
        sink.append(&AuditEntry::Execution(target)).unwrap();
        sink.append(&kill_switch_entry()).unwrap();

        let records = sink.records_for(id);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].execution_type, ExecutionType::BlockedByKillSwitch);
        assert_eq!(sink.execution_records().len(), 2);
    }

    /// Appends from many threads still form one unbroken chain.
    #[test]
    fn test_concurrent_appends_keep_chain_valid() {
        let sink = InMemoryAuditSink::new("stream-concurrent");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        sink.append(&entry(&format!("{i}-{j}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.len(), 200);
        assert!(sink.verify_integrity());
    }

    // ── Activity feed ─────────────────────────────────────────────────────────

    #[test]
    fn test_feed_returns_newest_first() {
        let feed = ActivityFeed::new();
        let first = make_record(ExecutionType::Autonomous, "first");
        let second = make_record(ExecutionType::Rejected, "second");
        feed.publish(&Notification::Execution(first)).unwrap();
        feed.publish(&Notification::Execution(second.clone())).unwrap();

        let recent = feed.recent(1);
        assert_eq!(recent, vec![Notification::Execution(second)]);
        assert_eq!(feed.recent(50).len(), 2);
    }

    #[test]
    fn test_feed_is_bounded() {
        let feed = Arc::new(ActivityFeed::with_capacity(3));
        for i in 0..5 {
            feed.publish(&Notification::Execution(make_record(ExecutionType::Autonomous, &i.to_string())))
                .unwrap();
        }

        assert_eq!(feed.len(), 3);
        let details: Vec<String> = feed
            .recent(10)
            .into_iter()
            .filter_map(|n| match n {
                Notification::Execution(r) => r.detail,
                _ => None,
            })
            .collect();
        assert_eq!(details, vec!["4", "3", "2"]);
    }
}
