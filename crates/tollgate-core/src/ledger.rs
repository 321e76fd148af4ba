//! The approval ledger: sole owner of `PendingRecord` mutation.
//!
//! Records live in a map of `ActionId → Arc<Mutex<PendingRecord>>`. The map
//! lock is held only long enough to insert or clone out an entry; every
//! state transition then runs under that record's own mutex. Decisions on
//! unrelated actions never contend, and decisions on the same action are
//! applied one at a time in acceptance order.
//!
//! Every mutating call returns a snapshot. No lock is ever held across a
//! call back into the engine or an external sink.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use tollgate_contracts::{
    action::{Action, ActionId, Actor},
    approval::{Decision, ExecutionProgress, PendingRecord, PendingStatus, Verdict},
    error::{GovernanceError, GovernanceResult},
    tier::{ApprovalRequirement, RiskTier},
};

/// The result of a single `decide` call.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The record after the decision was applied.
    pub record: PendingRecord,
    /// True only for the one call that moved the record out of `Pending`.
    pub resolved: bool,
}

/// How an execution handed out by `claim_execution` ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Executed,
    Failed(String),
}

/// In-memory, per-record-locked store of actions awaiting approval.
#[derive(Debug, Default)]
pub struct ApprovalLedger {
    records: RwLock<HashMap<ActionId, Arc<Mutex<PendingRecord>>>>,
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` as pending approval.
    ///
    /// Fails with `DuplicateAction` if the id was ever registered, whatever
    /// the status of the existing record.
    pub fn register(
        &self,
        action: Action,
        tier: RiskTier,
        requirement: ApprovalRequirement,
    ) -> GovernanceResult<PendingRecord> {
        let mut records = self.records.write();
        if records.contains_key(&action.id) {
            return Err(GovernanceError::DuplicateAction { action_id: action.id });
        }

        let action_id = action.id;
        let record = PendingRecord {
            action,
            tier,
            required_approvals: requirement,
            decisions: Vec::new(),
            status: PendingStatus::Pending,
            execution: ExecutionProgress::NotStarted,
            registered_at: Utc::now(),
            resolved_at: None,
        };
        records.insert(action_id, Arc::new(Mutex::new(record.clone())));

        debug!(action_id = %action_id, tier = %tier, "registered pending action");
        Ok(record)
    }

    /// Apply one actor's verdict.
    ///
    /// The proposing agent may not decide on its own action. A REJECT
    /// terminates the record immediately. An APPROVE terminates it as
    /// `Approved` once the quorum is met. Exactly one call per record
    /// observes `resolved == true`.
    pub fn decide(
        &self,
        action_id: ActionId,
        actor: Actor,
        verdict: Verdict,
        note: Option<String>,
    ) -> GovernanceResult<Resolution> {
        let entry = self.entry(action_id)?;
        let mut record = entry.lock();

        if record.status.is_terminal() {
            return Err(GovernanceError::TerminalAction {
                action_id,
                status: record.status,
            });
        }
        if record.action.proposer == actor.id {
            return Err(GovernanceError::Unauthorized {
                actor: actor.id,
                operation: format!("decide on action {} it proposed", action_id),
            });
        }
        if record.has_decided(&actor.id) {
            return Err(GovernanceError::AlreadyDecided {
                action_id,
                actor: actor.id,
            });
        }

        let now = Utc::now();
        record.decisions.push(Decision {
            actor,
            verdict,
            note,
            decided_at: now,
        });

        let next = match verdict {
            Verdict::Reject => Some(PendingStatus::Rejected),
            Verdict::Approve if quorum_met(&record) => Some(PendingStatus::Approved),
            Verdict::Approve => None,
        };

        let resolved = match next {
            Some(status) => {
                record.status = status;
                record.resolved_at = Some(now);
                info!(
                    action_id = %action_id,
                    status = %status,
                    decisions = record.decisions.len(),
                    "pending action resolved"
                );
                true
            }
            None => {
                debug!(
                    action_id = %action_id,
                    approvals = record.approval_count(),
                    required = %record.required_approvals,
                    "approval recorded, quorum not yet met"
                );
                false
            }
        };

        Ok(Resolution {
            record: record.clone(),
            resolved,
        })
    }

    /// Snapshot of one record, whatever its status.
    pub fn get(&self, action_id: ActionId) -> GovernanceResult<PendingRecord> {
        Ok(self.entry(action_id)?.lock().clone())
    }

    /// Every record still `Pending`, oldest proposal first.
    pub fn list_pending(&self) -> Vec<PendingRecord> {
        let mut pending: Vec<PendingRecord> = self
            .snapshot_entries()
            .into_iter()
            .filter_map(|entry| {
                let record = entry.lock();
                (record.status == PendingStatus::Pending).then(|| record.clone())
            })
            .collect();
        // Stable sort; the id breaks ties so equal timestamps order the same
        // way on every call.
        pending.sort_by(|a, b| {
            a.action
                .created_at
                .cmp(&b.action.created_at)
                .then_with(|| a.action.id.cmp(&b.action.id))
        });
        pending
    }

    /// Move a pending record to `Expired`.
    pub fn expire(&self, action_id: ActionId) -> GovernanceResult<PendingRecord> {
        let entry = self.entry(action_id)?;
        let mut record = entry.lock();
        if record.status.is_terminal() {
            return Err(GovernanceError::TerminalAction {
                action_id,
                status: record.status,
            });
        }
        record.status = PendingStatus::Expired;
        record.resolved_at = Some(Utc::now());
        info!(action_id = %action_id, "pending action expired");
        Ok(record.clone())
    }

    /// Expire every record still pending that was registered before `cutoff`.
    ///
    /// Returns only the records this call transitioned; a record resolved
    /// concurrently by `decide` is skipped.
    pub fn expire_older_than(&self, cutoff: DateTime<Utc>) -> Vec<PendingRecord> {
        self.snapshot_entries()
            .into_iter()
            .filter_map(|entry| {
                let mut record = entry.lock();
                if record.status != PendingStatus::Pending || record.registered_at >= cutoff {
                    return None;
                }
                record.status = PendingStatus::Expired;
                record.resolved_at = Some(Utc::now());
                info!(action_id = %record.action.id, "stale pending action expired");
                Some(record.clone())
            })
            .collect()
    }

    /// Claim the right to execute an approved record.
    ///
    /// Returns the action to execute for exactly one caller; every other
    /// caller (and any call on a record that is not approved) gets `None`.
    pub fn claim_execution(&self, action_id: ActionId) -> GovernanceResult<Option<Action>> {
        let entry = self.entry(action_id)?;
        let mut record = entry.lock();
        if !record.awaiting_execution() {
            return Ok(None);
        }
        record.execution = ExecutionProgress::InFlight;
        Ok(Some(record.action.clone()))
    }

    /// Record how a claimed execution ended.
    pub fn complete_execution(
        &self,
        action_id: ActionId,
        outcome: ExecutionOutcome,
    ) -> GovernanceResult<PendingRecord> {
        let entry = self.entry(action_id)?;
        let mut record = entry.lock();
        record.execution = match outcome {
            ExecutionOutcome::Executed => ExecutionProgress::Executed,
            ExecutionOutcome::Failed(reason) => ExecutionProgress::Failed { reason },
        };
        Ok(record.clone())
    }

    /// Ids of approved records whose execution has not started, oldest first.
    pub fn awaiting_execution(&self) -> Vec<ActionId> {
        let mut waiting: Vec<(DateTime<Utc>, ActionId)> = self
            .snapshot_entries()
            .into_iter()
            .filter_map(|entry| {
                let record = entry.lock();
                record
                    .awaiting_execution()
                    .then(|| (record.action.created_at, record.action.id))
            })
            .collect();
        waiting.sort();
        waiting.into_iter().map(|(_, id)| id).collect()
    }

    fn entry(&self, action_id: ActionId) -> GovernanceResult<Arc<Mutex<PendingRecord>>> {
        self.records
            .read()
            .get(&action_id)
            .cloned()
            .ok_or(GovernanceError::UnknownAction { action_id })
    }

    fn snapshot_entries(&self) -> Vec<Arc<Mutex<PendingRecord>>> {
        self.records.read().values().cloned().collect()
    }
}

/// Return true once the approvals on `record` satisfy its requirement.
fn quorum_met(record: &PendingRecord) -> bool {
    let approvers: Vec<&Actor> = record
        .decisions
        .iter()
        .filter(|d| d.verdict == Verdict::Approve)
        .map(|d| &d.actor)
        .collect();

    if approvers.len() < record.required_approvals.approvals as usize {
        return false;
    }
    match &record.required_approvals.approver_role {
        Some(role) => approvers.iter().any(|actor| actor.has_role(role)),
        None => true,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::{Duration, Utc};

    use tollgate_contracts::{
        action::{Action, ActionId, ActionKind, Actor},
        approval::{ExecutionProgress, PendingStatus, Verdict},
        error::GovernanceError,
        tier::{ApprovalRequirement, RiskTier},
    };

    use super::{ApprovalLedger, ExecutionOutcome};

    fn make_action(magnitude: f64) -> Action {
        Action::new(ActionKind::PurchaseOrder, magnitude, serde_json::json!({}), "quartermaster")
    }

    fn register_high(ledger: &ApprovalLedger) -> ActionId {
        let action = make_action(300_000.0);
        let id = action.id;
        ledger
            .register(action, RiskTier::High, ApprovalRequirement::count(2))
            .unwrap();
        id
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let ledger = ApprovalLedger::new();
        let action = make_action(100_000.0);
        ledger
            .register(action.clone(), RiskTier::Medium, ApprovalRequirement::count(1))
            .unwrap();

        match ledger.register(action, RiskTier::Medium, ApprovalRequirement::count(1)) {
            Err(GovernanceError::DuplicateAction { .. }) => {}
            other => panic!("expected DuplicateAction, got {:?}", other),
        }
    }

    /// Re-registering a terminal record's id is still a duplicate.
    #[test]
    fn test_register_rejects_terminal_duplicates() {
        let ledger = ApprovalLedger::new();
        let action = make_action(100_000.0);
        let id = action.id;
        ledger
            .register(action.clone(), RiskTier::Medium, ApprovalRequirement::count(1))
            .unwrap();
        ledger.decide(id, Actor::new("alice"), Verdict::Reject, None).unwrap();

        assert!(matches!(
            ledger.register(action, RiskTier::Medium, ApprovalRequirement::count(1)),
            Err(GovernanceError::DuplicateAction { .. })
        ));
    }

    #[test]
    fn test_decide_unknown_action() {
        let ledger = ApprovalLedger::new();
        match ledger.decide(ActionId::new(), Actor::new("alice"), Verdict::Approve, None) {
            Err(GovernanceError::UnknownAction { .. }) => {}
            other => panic!("expected UnknownAction, got {:?}", other),
        }
    }

    #[test]
    fn test_quorum_of_two() {
        let ledger = ApprovalLedger::new();
        let id = register_high(&ledger);

        let first = ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).unwrap();
        assert!(!first.resolved);
        assert_eq!(first.record.status, PendingStatus::Pending);

        let second = ledger.decide(id, Actor::new("bob"), Verdict::Approve, None).unwrap();
        assert!(second.resolved);
        assert_eq!(second.record.status, PendingStatus::Approved);
        assert!(second.record.resolved_at.is_some());
    }

    #[test]
    fn test_reject_is_absolute() {
        let ledger = ApprovalLedger::new();
        let id = register_high(&ledger);

        ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).unwrap();
        let rejected = ledger
            .decide(id, Actor::new("bob"), Verdict::Reject, Some("vendor not vetted".into()))
            .unwrap();
        assert!(rejected.resolved);
        assert_eq!(rejected.record.status, PendingStatus::Rejected);

        match ledger.decide(id, Actor::new("carol"), Verdict::Approve, None) {
            Err(GovernanceError::TerminalAction { status, .. }) => {
                assert_eq!(status, PendingStatus::Rejected);
            }
            other => panic!("expected TerminalAction, got {:?}", other),
        }
    }

    #[test]
    fn test_double_vote_rejected_and_decisions_unchanged() {
        let ledger = ApprovalLedger::new();
        let id = register_high(&ledger);

        ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).unwrap();
        match ledger.decide(id, Actor::new("alice"), Verdict::Approve, None) {
            Err(GovernanceError::AlreadyDecided { actor, .. }) => assert_eq!(actor, "alice"),
            other => panic!("expected AlreadyDecided, got {:?}", other),
        }

        let record = ledger.get(id).unwrap();
        assert_eq!(record.decisions.len(), 1);
        assert_eq!(record.status, PendingStatus::Pending);
    }

    /// The proposer's vote is refused and leaves the record untouched.
    #[test]
    fn test_proposer_cannot_decide_own_action() {
        let ledger = ApprovalLedger::new();
        let action = make_action(100_000.0);
        let id = action.id;
        ledger
            .register(action, RiskTier::Medium, ApprovalRequirement::count(1))
            .unwrap();

        for verdict in [Verdict::Approve, Verdict::Reject] {
            match ledger.decide(id, Actor::new("quartermaster"), verdict, None) {
                Err(GovernanceError::Unauthorized { actor, .. }) => assert_eq!(actor, "quartermaster"),
                other => panic!("expected Unauthorized, got {:?}", other),
            }
        }
        let record = ledger.get(id).unwrap();
        assert!(record.decisions.is_empty());
        assert_eq!(record.status, PendingStatus::Pending);

        let approved = ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).unwrap();
        assert!(approved.resolved);
    }

    /// A designated-role quorum is not met by headcount alone.
    #[test]
    fn test_designated_role_quorum() {
        let ledger = ApprovalLedger::new();
        let action = make_action(900_000.0);
        let id = action.id;
        ledger
            .register(
                action,
                RiskTier::Critical,
                ApprovalRequirement::with_role(1, "chief_medical_officer"),
            )
            .unwrap();

        let a = ledger
            .decide(id, Actor::with_role("alice", "procurement_manager"), Verdict::Approve, None)
            .unwrap();
        let b = ledger
            .decide(id, Actor::with_role("bob", "finance_manager"), Verdict::Approve, None)
            .unwrap();
        assert!(!a.resolved && !b.resolved);
        assert_eq!(b.record.status, PendingStatus::Pending);

        let c = ledger
            .decide(id, Actor::with_role("carol", "chief_medical_officer"), Verdict::Approve, None)
            .unwrap();
        assert!(c.resolved);
        assert_eq!(c.record.status, PendingStatus::Approved);
    }

    #[test]
    fn test_list_pending_is_oldest_first_and_pending_only() {
        let ledger = ApprovalLedger::new();
        let base = Utc::now();

        let mut ids = Vec::new();
        for offset in [30, 10, 20] {
            let mut action = make_action(100_000.0);
            action.created_at = base + Duration::seconds(offset);
            ids.push(action.id);
            ledger
                .register(action, RiskTier::Medium, ApprovalRequirement::count(1))
                .unwrap();
        }
        // Resolve the middle-aged one; it must drop out of the list.
        ledger.decide(ids[2], Actor::new("alice"), Verdict::Approve, None).unwrap();

        let pending = ledger.list_pending();
        let listed: Vec<ActionId> = pending.iter().map(|r| r.action.id).collect();
        assert_eq!(listed, vec![ids[1], ids[0]]);
    }

    #[test]
    fn test_expire_then_decide_is_terminal() {
        let ledger = ApprovalLedger::new();
        let id = register_high(&ledger);

        let expired = ledger.expire(id).unwrap();
        assert_eq!(expired.status, PendingStatus::Expired);

        assert!(matches!(
            ledger.decide(id, Actor::new("alice"), Verdict::Approve, None),
            Err(GovernanceError::TerminalAction { .. })
        ));
        assert!(matches!(ledger.expire(id), Err(GovernanceError::TerminalAction { .. })));
    }

    #[test]
    fn test_expire_older_than_skips_recent_and_resolved() {
        let ledger = ApprovalLedger::new();
        let stale = register_high(&ledger);
        let resolved = register_high(&ledger);
        ledger.decide(resolved, Actor::new("alice"), Verdict::Reject, None).unwrap();

        let cutoff = Utc::now() + Duration::seconds(1);
        let fresh_action = make_action(100_000.0);
        let fresh = fresh_action.id;
        ledger
            .register(fresh_action, RiskTier::Medium, ApprovalRequirement::count(1))
            .unwrap();
        // Pretend `fresh` arrived after the cutoff.
        ledger.records.read()[&fresh].lock().registered_at = cutoff + Duration::seconds(5);

        let expired = ledger.expire_older_than(cutoff);
        let ids: Vec<ActionId> = expired.iter().map(|r| r.action.id).collect();
        assert_eq!(ids, vec![stale]);
        assert_eq!(ledger.get(fresh).unwrap().status, PendingStatus::Pending);
        assert_eq!(ledger.get(resolved).unwrap().status, PendingStatus::Rejected);
    }

    #[test]
    fn test_claim_execution_only_once() {
        let ledger = ApprovalLedger::new();
        let action = make_action(100_000.0);
        let id = action.id;
        ledger
            .register(action, RiskTier::Medium, ApprovalRequirement::count(1))
            .unwrap();

        // Not approved yet: nothing to claim.
        assert!(ledger.claim_execution(id).unwrap().is_none());

        ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).unwrap();
        assert_eq!(ledger.awaiting_execution(), vec![id]);

        assert!(ledger.claim_execution(id).unwrap().is_some());
        assert!(ledger.claim_execution(id).unwrap().is_none());
        assert!(ledger.awaiting_execution().is_empty());

        let done = ledger.complete_execution(id, ExecutionOutcome::Executed).unwrap();
        assert_eq!(done.execution, ExecutionProgress::Executed);
    }

    /// N approvers racing on a quorum of 2: exactly one call resolves.
    #[test]
    fn test_concurrent_approvals_resolve_once() {
        let ledger = Arc::new(ApprovalLedger::new());
        let id = register_high(&ledger);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ledger.decide(id, Actor::new(format!("approver-{i}")), Verdict::Approve, None)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let resolved = results
            .iter()
            .filter(|r| matches!(r, Ok(res) if res.resolved))
            .count();
        let terminal = results
            .iter()
            .filter(|r| matches!(r, Err(GovernanceError::TerminalAction { .. })))
            .count();

        assert_eq!(resolved, 1, "exactly one decision may observe the transition");
        assert_eq!(terminal, 6, "decisions after quorum must fail TerminalAction");
        assert_eq!(ledger.get(id).unwrap().approval_count(), 2);
    }

    /// `expire` racing `decide`: exactly one transition wins.
    #[test]
    fn test_expire_races_decide() {
        for _ in 0..50 {
            let ledger = Arc::new(ApprovalLedger::new());
            let action = make_action(100_000.0);
            let id = action.id;
            ledger
                .register(action, RiskTier::Medium, ApprovalRequirement::count(1))
                .unwrap();
            let barrier = Arc::new(Barrier::new(2));

            let deciding = {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ledger.decide(id, Actor::new("alice"), Verdict::Approve, None).is_ok()
                })
            };
            barrier.wait();
            let expired = ledger.expire(id).is_ok();
            let decided = deciding.join().unwrap();

            assert!(expired ^ decided, "exactly one transition must win");
        }
    }
}
