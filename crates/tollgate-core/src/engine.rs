//! The governance engine: the trust boundary between agents and the world.
//!
//! Every proposed action flows through the same pipeline:
//!
//!   Validate → Classify → Claim id → Kill switch → [Execute | Ledger | Block] → Audit
//!
//! The safety invariant is absolute: `ActionExecutor::execute()` is only ever
//! called while holding an `ExecutionPermit` from the kill switch, and for
//! approved actions only after the ledger handed out the single execution
//! claim for that id. No governance lock is held while the executor, the
//! audit sink or the notification sink runs.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tollgate_contracts::{
    action::{Action, ActionId, ActionKind, Actor},
    approval::{PendingRecord, PendingStatus, Verdict},
    error::{GovernanceError, GovernanceResult},
    execution::{AuditEntry, Disposition, ExecutionRecord, ExecutionType, Notification},
    kill_switch::{KillSwitchEvent, KillSwitchState},
    tier::{ApprovalRequirement, RiskTier},
};

use crate::{
    kill_switch::KillSwitch,
    ledger::{ApprovalLedger, ExecutionOutcome},
    traits::{ActionExecutor, AuditSink, NotificationSink, NullNotifier, PayloadVerifier, RiskClassifier},
};

/// What happened when the engine tried to run an approved action.
#[derive(Debug)]
enum ApprovedRun {
    Executed(ExecutionRecord),
    /// The kill switch is active; the record stays approved-but-unexecuted.
    Deferred(KillSwitchState),
    /// Another caller already claimed (or finished) the execution.
    AlreadyClaimed,
}

/// What one pass over approved-but-unexecuted records did.
#[derive(Debug, Clone, Default)]
pub struct Rescan {
    /// Deferred approved actions executed by this pass, oldest first.
    pub resumed: Vec<ExecutionRecord>,
    /// Deferred approved actions whose execution failed, with the reason.
    /// They are not retried; the agent must re-propose under a new id.
    pub failed: Vec<(ActionId, String)>,
}

/// The outcome of deactivating the kill switch.
#[derive(Debug, Clone)]
pub struct Resumption {
    /// The audit event for the deactivation itself.
    pub event: KillSwitchEvent,
    /// Deferred approved actions executed by the re-scan, oldest first.
    pub resumed: Vec<ExecutionRecord>,
    /// Deferred approved actions the executor failed on.
    pub failed: Vec<(ActionId, String)>,
}

/// The central governance engine shared by every agent and approver.
///
/// Construct one per deployment, wrap it in an `Arc`, and call it from as
/// many threads as needed. The kill switch is injected so several engines
/// (or a test) can share or isolate it explicitly.
pub struct GovernanceEngine {
    classifier: Box<dyn RiskClassifier>,
    executor: Box<dyn ActionExecutor>,
    audit: Box<dyn AuditSink>,
    notifier: Box<dyn NotificationSink>,
    verifier: Option<Box<dyn PayloadVerifier>>,
    kill_switch: Arc<KillSwitch>,
    ledger: ApprovalLedger,
    /// Every id ever accepted past validation, whatever its disposition.
    proposed: Mutex<HashSet<ActionId>>,
    /// Roles allowed to toggle the kill switch. Empty means any named actor.
    operator_roles: Vec<String>,
}

impl GovernanceEngine {
    /// Create an engine with its own inactive kill switch, no payload
    /// verifier and a notification sink that drops everything.
    pub fn new(
        classifier: Box<dyn RiskClassifier>,
        executor: Box<dyn ActionExecutor>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            classifier,
            executor,
            audit,
            notifier: Box::new(NullNotifier),
            verifier: None,
            kill_switch: Arc::new(KillSwitch::new()),
            ledger: ApprovalLedger::new(),
            proposed: Mutex::new(HashSet::new()),
            operator_roles: Vec::new(),
        }
    }

    /// Use `kill_switch` instead of a private one.
    pub fn with_kill_switch(mut self, kill_switch: Arc<KillSwitch>) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_verifier(mut self, verifier: Box<dyn PayloadVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Restrict kill switch operation to actors holding one of `roles`.
    pub fn with_operator_roles(mut self, roles: Vec<String>) -> Self {
        self.operator_roles = roles;
        self
    }

    // ── Command surface ──────────────────────────────────────────────────────

    /// Decide what happens to a proposed action.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the proposal (and its payload, if a verifier is set)
    /// 2. Classify the tier; an unconfigured kind fails `UnknownActionKind`
    /// 3. Claim the id; a reused id fails `DuplicateAction`
    /// 4. Kill switch active → audit `BlockedByKillSwitch`, return `Blocked`
    /// 5. Autonomous quorum → execute once under a permit, audit `Autonomous`
    /// 6. Otherwise register with the ledger and return `AwaitingApproval`
    ///
    /// # Errors
    ///
    /// Steps 1–3 fail before anything is recorded. An executor failure in
    /// step 5 returns `ExecutionFailed` without an audit record; the agent
    /// must re-propose under a new id.
    pub fn propose_action(&self, action: Action) -> GovernanceResult<Disposition> {
        debug!(
            action_id = %action.id,
            kind = %action.kind,
            magnitude = action.magnitude,
            proposer = %action.proposer,
            "evaluating proposed action"
        );

        // ── Steps 1–2: Validate and classify ─────────────────────────────────
        self.validate(&action)?;
        let tier = self.classifier.classify(&action.kind, action.magnitude)?;
        let requirement = self.classifier.requirement(&action.kind, tier);
        let rationale = self.classifier.explain(&action.kind, action.magnitude, tier);

        // ── Step 3: Claim the id ─────────────────────────────────────────────
        if !self.proposed.lock().insert(action.id) {
            return Err(GovernanceError::DuplicateAction { action_id: action.id });
        }

        // ── Steps 4–5: Autonomous path, admitted atomically ──────────────────
        if requirement.is_autonomous() {
            let permit = match self.kill_switch.try_admit() {
                Ok(permit) => permit,
                Err(state) => return Ok(self.block(&action, tier, requirement, rationale, state)),
            };

            let result = self.executor.execute(&action);
            drop(permit);

            return match result {
                Ok(outcome) => {
                    let record = execution_record(&action, tier, ExecutionType::Autonomous, None, None);
                    info!(
                        action_id = %action.id,
                        kind = %action.kind,
                        tier = %tier,
                        "action executed autonomously"
                    );
                    self.record(&record);
                    Ok(Disposition::Executed {
                        action_id: action.id,
                        tier,
                        required_approvals: requirement,
                        rationale,
                        record,
                        outcome,
                    })
                }
                Err(err) => {
                    let reason = failure_reason(err);
                    warn!(
                        action_id = %action.id,
                        kind = %action.kind,
                        reason = %reason,
                        "autonomous execution failed; re-proposal required"
                    );
                    Err(GovernanceError::ExecutionFailed {
                        action_id: action.id,
                        reason,
                    })
                }
            };
        }

        // ── Step 4 for the approval path ─────────────────────────────────────
        let state = self.kill_switch.status();
        if state.active {
            return Ok(self.block(&action, tier, requirement, rationale, state));
        }

        // ── Step 6: Register for human approval ──────────────────────────────
        let action_id = action.id;
        let record = self.ledger.register(action, tier, requirement.clone())?;
        info!(
            action_id = %action_id,
            kind = %record.action.kind,
            tier = %tier,
            required = %requirement,
            rationale = %rationale,
            "action awaiting approval"
        );
        self.publish(&Notification::Pending(record));

        Ok(Disposition::AwaitingApproval {
            action_id,
            tier,
            required_approvals: requirement,
            rationale,
        })
    }

    /// Record an approver's verdict on a pending action.
    ///
    /// The decision that resolves the record to `Approved` triggers exactly
    /// one execution, unless the kill switch is active, in which case the
    /// vote is kept and execution waits for deactivation. A resolving
    /// `Reject` is audited and never executed.
    ///
    /// # Errors
    ///
    /// `UnknownAction`, `TerminalAction`, `AlreadyDecided` and `Unauthorized`
    /// (the proposer voting on its own action) from the ledger.
    /// `ExecutionFailed` if the triggered execution failed; the vote itself
    /// stays recorded and the failure is audited.
    pub fn decide(
        &self,
        action_id: ActionId,
        actor: Actor,
        verdict: Verdict,
        note: Option<String>,
    ) -> GovernanceResult<PendingRecord> {
        if actor.id.trim().is_empty() {
            return Err(GovernanceError::InvalidAction {
                reason: "decision actor id must not be empty".to_string(),
            });
        }

        let actor_id = actor.id.clone();
        let resolution = self.ledger.decide(action_id, actor, verdict, note)?;
        let record = resolution.record;
        self.publish(&Notification::Pending(record.clone()));

        if !resolution.resolved {
            return Ok(record);
        }

        match record.status {
            PendingStatus::Rejected => {
                let note = record.decisions.last().and_then(|d| d.note.clone());
                let rejected = execution_record(
                    &record.action,
                    record.tier,
                    ExecutionType::Rejected,
                    Some(actor_id),
                    note,
                );
                info!(action_id = %action_id, rejected_by = ?rejected.decided_by, "action rejected");
                self.record(&rejected);
                Ok(record)
            }
            PendingStatus::Approved => match self.run_approved(action_id)? {
                ApprovedRun::Deferred(state) => {
                    warn!(
                        action_id = %action_id,
                        kill_switch_reason = ?state.reason,
                        "action approved while kill switch active; execution deferred"
                    );
                    Ok(record)
                }
                ApprovedRun::Executed(_) | ApprovedRun::AlreadyClaimed => self.ledger.get(action_id),
            },
            PendingStatus::Pending | PendingStatus::Expired => Ok(record),
        }
    }

    /// Throw the kill switch. Audited and published even when already active.
    pub fn activate_kill_switch(
        &self,
        reason: impl Into<String>,
        actor: &Actor,
    ) -> GovernanceResult<KillSwitchEvent> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(GovernanceError::InvalidAction {
                reason: "kill switch activation requires a reason".to_string(),
            });
        }
        self.authorize(actor, "activate the kill switch")?;

        let event = self.kill_switch.activate(reason, actor.id.clone());
        self.record_kill_switch(&event);
        Ok(event)
    }

    /// Release the kill switch and execute every approved action that was
    /// deferred while it was active.
    pub fn deactivate_kill_switch(
        &self,
        actor: &Actor,
        notes: Option<String>,
    ) -> GovernanceResult<Resumption> {
        self.authorize(actor, "deactivate the kill switch")?;

        let event = self.kill_switch.deactivate(actor.id.clone(), notes);
        self.record_kill_switch(&event);

        let Rescan { resumed, failed } = self.resume_deferred();
        if !resumed.is_empty() || !failed.is_empty() {
            info!(
                executed = resumed.len(),
                failed = failed.len(),
                "deferred approved actions run after deactivation"
            );
        }
        Ok(Resumption { event, resumed, failed })
    }

    /// Execute approved-but-unexecuted records, oldest first.
    ///
    /// Safe to call at any time and from several threads: each record is
    /// executed at most once, and the scan stops if the switch is thrown
    /// again. Failures are audited, reported in `Rescan::failed` and never
    /// retried.
    pub fn resume_deferred(&self) -> Rescan {
        let mut rescan = Rescan::default();
        for action_id in self.ledger.awaiting_execution() {
            match self.run_approved(action_id) {
                Ok(ApprovedRun::Executed(record)) => rescan.resumed.push(record),
                Ok(ApprovedRun::AlreadyClaimed) => {}
                Ok(ApprovedRun::Deferred(_)) => {
                    debug!("kill switch re-activated during re-scan; stopping");
                    break;
                }
                Err(GovernanceError::ExecutionFailed { action_id, reason }) => {
                    rescan.failed.push((action_id, reason));
                }
                Err(err) => {
                    warn!(action_id = %action_id, error = %err, "deferred execution could not run");
                    rescan.failed.push((action_id, err.to_string()));
                }
            }
        }
        rescan
    }

    /// Expire a pending action (driven by an external scheduler).
    pub fn expire(&self, action_id: ActionId) -> GovernanceResult<PendingRecord> {
        let record = self.ledger.expire(action_id)?;
        self.record_expiry(&record);
        Ok(record)
    }

    /// Expire every pending action registered before `cutoff`.
    pub fn expire_older_than(&self, cutoff: DateTime<Utc>) -> Vec<PendingRecord> {
        let expired = self.ledger.expire_older_than(cutoff);
        for record in &expired {
            self.record_expiry(record);
        }
        expired
    }

    // ── Query surface ────────────────────────────────────────────────────────

    /// Pending actions, oldest first.
    pub fn list_pending(&self) -> Vec<PendingRecord> {
        self.ledger.list_pending()
    }

    /// Any record the ledger holds, pending or not.
    pub fn get(&self, action_id: ActionId) -> GovernanceResult<PendingRecord> {
        self.ledger.get(action_id)
    }

    pub fn is_kill_switch_active(&self) -> bool {
        self.kill_switch.is_active()
    }

    pub fn kill_switch_status(&self) -> KillSwitchState {
        self.kill_switch.status()
    }

    pub fn kill_switch(&self) -> &Arc<KillSwitch> {
        &self.kill_switch
    }

    /// Preview the tier for `(kind, magnitude)` without recording anything.
    pub fn classify(&self, kind: &ActionKind, magnitude: f64) -> GovernanceResult<RiskTier> {
        self.classifier.classify(kind, magnitude)
    }

    /// The quorum an action of `kind` at `tier` must reach.
    pub fn requirement_for(&self, kind: &ActionKind, tier: RiskTier) -> ApprovalRequirement {
        self.classifier.requirement(kind, tier)
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn validate(&self, action: &Action) -> GovernanceResult<()> {
        if action.proposer.trim().is_empty() {
            return Err(GovernanceError::InvalidAction {
                reason: "proposer must not be empty".to_string(),
            });
        }
        if !action.magnitude.is_finite() || action.magnitude < 0.0 {
            return Err(GovernanceError::InvalidAction {
                reason: format!(
                    "magnitude must be a finite, non-negative number (got {})",
                    action.magnitude
                ),
            });
        }
        if let Some(verifier) = &self.verifier {
            let violations = verifier.verify(&action.kind, &action.payload);
            if !violations.is_empty() {
                let reason = violations.join("; ");
                warn!(action_id = %action.id, kind = %action.kind, violations = %reason, "payload rejected");
                return Err(GovernanceError::InvalidAction { reason });
            }
        }
        Ok(())
    }

    fn authorize(&self, actor: &Actor, operation: &str) -> GovernanceResult<()> {
        if actor.id.trim().is_empty() {
            return Err(GovernanceError::InvalidAction {
                reason: "kill switch operator id must not be empty".to_string(),
            });
        }
        if !self.operator_roles.is_empty()
            && !self.operator_roles.iter().any(|role| actor.has_role(role))
        {
            warn!(actor = %actor, operation, "unauthorized kill switch operation");
            return Err(GovernanceError::Unauthorized {
                actor: actor.id.clone(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    fn block(
        &self,
        action: &Action,
        tier: RiskTier,
        requirement: ApprovalRequirement,
        rationale: String,
        state: KillSwitchState,
    ) -> Disposition {
        let reason = state.reason.unwrap_or_default();
        let activated_by = state.activated_by.unwrap_or_default();
        let activated_at = state.activated_at.unwrap_or_else(Utc::now);

        warn!(
            action_id = %action.id,
            kind = %action.kind,
            tier = %tier,
            activated_by = %activated_by,
            "action blocked by kill switch"
        );

        let record = execution_record(
            action,
            tier,
            ExecutionType::BlockedByKillSwitch,
            Some(activated_by.clone()),
            Some(reason.clone()),
        );
        self.record(&record);

        Disposition::Blocked {
            action_id: action.id,
            tier,
            required_approvals: requirement,
            rationale,
            reason,
            activated_by,
            activated_at,
        }
    }

    /// Execute an approved record if the switch admits it and nobody else
    /// has claimed it. The permit is taken before the claim so a refused
    /// admission leaves the record untouched for the re-scan.
    fn run_approved(&self, action_id: ActionId) -> GovernanceResult<ApprovedRun> {
        let permit = match self.kill_switch.try_admit() {
            Ok(permit) => permit,
            Err(state) => return Ok(ApprovedRun::Deferred(state)),
        };
        let Some(action) = self.ledger.claim_execution(action_id)? else {
            return Ok(ApprovedRun::AlreadyClaimed);
        };

        let result = self.executor.execute(&action);
        drop(permit);

        match result {
            Ok(_) => {
                let record = self.ledger.complete_execution(action_id, ExecutionOutcome::Executed)?;
                let approved_by = record.decisions.last().map(|d| d.actor.id.clone());
                let executed = execution_record(
                    &record.action,
                    record.tier,
                    ExecutionType::Approved,
                    approved_by,
                    None,
                );
                info!(
                    action_id = %action_id,
                    kind = %record.action.kind,
                    approved_by = ?executed.decided_by,
                    "approved action executed"
                );
                self.record(&executed);
                Ok(ApprovedRun::Executed(executed))
            }
            Err(err) => {
                let reason = failure_reason(err);
                let record = self
                    .ledger
                    .complete_execution(action_id, ExecutionOutcome::Failed(reason.clone()))?;
                warn!(action_id = %action_id, reason = %reason, "approved action failed to execute");
                // Terminal vote, audited though nothing ran.
                let failed = execution_record(
                    &record.action,
                    record.tier,
                    ExecutionType::Approved,
                    record.decisions.last().map(|d| d.actor.id.clone()),
                    Some(format!("execution failed: {}", reason)),
                );
                self.record(&failed);
                self.publish(&Notification::Pending(record));
                Err(GovernanceError::ExecutionFailed { action_id, reason })
            }
        }
    }

    fn record_expiry(&self, record: &PendingRecord) {
        let expired = execution_record(
            &record.action,
            record.tier,
            ExecutionType::Expired,
            None,
            Some(format!("{} approval(s) collected", record.approval_count())),
        );
        self.record(&expired);
    }

    fn record_kill_switch(&self, event: &KillSwitchEvent) {
        self.append(&AuditEntry::KillSwitch(event.clone()));
        self.publish(&Notification::KillSwitch(event.clone()));
    }

    fn record(&self, record: &ExecutionRecord) {
        self.append(&AuditEntry::Execution(record.clone()));
        self.publish(&Notification::Execution(record.clone()));
    }

    /// Audit failures degrade to a warning; the decision already stands.
    fn append(&self, entry: &AuditEntry) {
        if let Err(err) = self.audit.append(entry) {
            warn!(error = %err, "audit sink append failed; governance decision stands");
        }
    }

    fn publish(&self, notification: &Notification) {
        if let Err(err) = self.notifier.publish(notification) {
            debug!(error = %err, "notification dropped");
        }
    }
}

fn execution_record(
    action: &Action,
    tier: RiskTier,
    execution_type: ExecutionType,
    decided_by: Option<String>,
    detail: Option<String>,
) -> ExecutionRecord {
    ExecutionRecord {
        action_id: action.id,
        kind: action.kind.clone(),
        tier,
        execution_type,
        decided_by,
        detail,
        recorded_at: Utc::now(),
    }
}

fn failure_reason(err: GovernanceError) -> String {
    match err {
        GovernanceError::ExecutionFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
