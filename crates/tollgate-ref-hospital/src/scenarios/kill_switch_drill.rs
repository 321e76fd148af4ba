//! Scenario 3: Kill Switch Drill
//!
//! Security suspects the procurement host is compromised while a large order
//! is half-approved. The kill switch halts everything, including orders that
//! would normally run without anyone looking.
//!
//! Walk-through:
//!   1. Ventilator order ($315,000, HIGH) collects its first approval
//!   2. An unprivileged user tries to throw the switch → unauthorized
//!   3. The system administrator throws the switch
//!   4. A $5,000 order (LOW) is blocked, with the reason and activator reported
//!   5. Finance casts the final approval → recorded and APPROVED, but deferred
//!   6. The switch is released → the deferred order executes exactly once
//!   7. Audit chain integrity verified at the end

use tollgate_contracts::{
    action::Actor,
    approval::Verdict,
    error::{GovernanceError, GovernanceResult},
};

use crate::{
    mock_data::{finance_manager, procurement_manager, purchase_order, system_administrator},
    runtime::HospitalRuntime,
    scenarios::{describe, print_audit_summary},
};

/// Run Scenario 3 on `runtime`.
pub fn run(runtime: &HospitalRuntime) -> GovernanceResult<()> {
    println!("=== Scenario 3: Kill Switch Drill ===");
    println!();
    let engine = &runtime.engine;

    // ── 1. Order in flight ────────────────────────────────────────────────────

    let ventilators = purchase_order("ventilators", 7);
    let ventilators_id = ventilators.id;
    println!("  Order: 7 ventilators (${:.0})", ventilators.magnitude);
    println!("    → {}", describe(&engine.propose_action(ventilators)?));
    let record = engine.decide(ventilators_id, procurement_manager(), Verdict::Approve, None)?;
    println!("    procurement_manager approves → {} ({}/2)", record.status, record.approval_count());
    println!();

    // ── 2–3. Throwing the switch ──────────────────────────────────────────────

    let intern = Actor::with_role("j.doe", "intern");
    match engine.activate_kill_switch("testing the big red button", &intern) {
        Err(err @ GovernanceError::Unauthorized { .. }) => println!("  intern: {}", err),
        Err(other) => return Err(other),
        Ok(_) => println!("  intern activated the kill switch"),
    }

    let event = engine.activate_kill_switch(
        "suspected compromise of procurement host",
        &system_administrator(),
    )?;
    println!(
        "  KILL SWITCH ACTIVATED by {} ({} execution(s) in flight)",
        event.actor, event.in_flight
    );
    println!();

    // ── 4. Even routine work stops ────────────────────────────────────────────

    let gloves = purchase_order("ppe_kits", 10);
    println!("  Order: 10 PPE kits (${:.0})", gloves.magnitude);
    println!("    → {}", describe(&engine.propose_action(gloves)?));
    println!();

    // ── 5. Approval under the switch ──────────────────────────────────────────

    let record = engine.decide(ventilators_id, finance_manager(), Verdict::Approve, None)?;
    println!(
        "  finance_manager approves ventilators → {} (execution {:?}, deferred)",
        record.status, record.execution
    );
    println!("  Orders placed so far:   {}", runtime.executor.executed().len());
    println!();

    // ── 6. Release ────────────────────────────────────────────────────────────

    let resumption = engine.deactivate_kill_switch(
        &system_administrator(),
        Some("host reimaged, credentials rotated".to_string()),
    )?;
    println!("  Kill switch deactivated by {}", resumption.event.actor);
    println!("    deferred orders executed:    {}", resumption.resumed.len());
    for (action_id, reason) in &resumption.failed {
        println!("    deferred order {} FAILED: {}", action_id, reason);
    }
    println!(
        "    ventilator order executions: {}",
        runtime.executor.times_executed(ventilators_id)
    );
    println!();

    print_audit_summary(runtime);
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use tollgate_contracts::{
        approval::{ExecutionProgress, PendingStatus},
        execution::{AuditEntry, ExecutionType},
        kill_switch::KillSwitchEventKind,
    };
    use tollgate_policy::ThresholdClassifier;

    use super::run;
    use crate::runtime::HospitalRuntime;

    fn runtime() -> HospitalRuntime {
        HospitalRuntime::with_classifier(ThresholdClassifier::bundled().unwrap()).unwrap()
    }

    #[test]
    fn test_drill_defers_then_resumes() {
        let runtime = runtime();
        run(&runtime).unwrap();

        // Only the deferred ventilator order ran; the PPE order stayed blocked.
        let executed = runtime.executor.executed();
        assert_eq!(executed.len(), 1);
        let record = runtime.engine.get(executed[0].id).unwrap();
        assert_eq!(record.status, PendingStatus::Approved);
        assert_eq!(record.execution, ExecutionProgress::Executed);
        assert!(!runtime.engine.is_kill_switch_active());
    }

    #[test]
    fn test_drill_audit_trail() {
        let runtime = runtime();
        run(&runtime).unwrap();

        let log = runtime.audit.export_log();
        let kinds: Vec<String> = log
            .events
            .iter()
            .map(|event| match &event.entry {
                AuditEntry::KillSwitch(e) if e.kind == KillSwitchEventKind::Activated => "ON".to_string(),
                AuditEntry::KillSwitch(_) => "OFF".to_string(),
                AuditEntry::Execution(r) => format!("{:?}", r.execution_type),
            })
            .collect();

        // The unauthorized attempt never reaches the audit chain.
        assert_eq!(kinds, vec!["ON", "BlockedByKillSwitch", "OFF", "Approved"]);
        assert!(runtime.audit.verify_integrity());

        let blocked = runtime
            .audit
            .execution_records()
            .into_iter()
            .find(|r| r.execution_type == ExecutionType::BlockedByKillSwitch)
            .unwrap();
        assert_eq!(blocked.decided_by.as_deref(), Some("ops.lead"));
        assert_eq!(blocked.detail.as_deref(), Some("suspected compromise of procurement host"));
    }
}
