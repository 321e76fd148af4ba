//! Scenario 1: Quartermaster Procurement
//!
//! The quartermaster agent closes supply gaps by ordering from vendors. The
//! order cost decides how much human sign-off is needed.
//!
//! Walk-through:
//!   1. Oxygen cylinders, $30,000 → LOW, executed autonomously
//!   2. Ventilators, $315,000 → HIGH, procurement + finance approve, executed once
//!   3. Ventilators, $675,000 → CRITICAL, finance alone is not enough; the
//!      chief medical officer's approval completes the quorum
//!   4. PPE kits, $100,000 → MEDIUM, the quartermaster's own approval is
//!      refused, then finance rejects; nothing is ordered
//!   5. IV fluids with the vendor offline → execution failure surfaced to the agent
//!   6. Audit chain integrity verified at the end

use tollgate_contracts::{
    action::Actor,
    approval::Verdict,
    error::{GovernanceError, GovernanceResult},
};

use crate::{
    mock_data::{
        chief_medical_officer, finance_manager, procurement_manager, purchase_order, QUARTERMASTER,
    },
    runtime::HospitalRuntime,
    scenarios::{describe, print_audit_summary},
};

/// Run Scenario 1 on `runtime`.
pub fn run(runtime: &HospitalRuntime) -> GovernanceResult<()> {
    println!("=== Scenario 1: Quartermaster Procurement ===");
    println!();
    let engine = &runtime.engine;

    // ── 1. Routine restock ────────────────────────────────────────────────────

    let oxygen = purchase_order("oxygen_cylinders", 6);
    println!("  Order: 6 oxygen cylinders (${:.0})", oxygen.magnitude);
    let disposition = engine.propose_action(oxygen)?;
    println!("    → {}", describe(&disposition));
    println!();

    // ── 2. Two-person approval ────────────────────────────────────────────────

    let ventilators = purchase_order("ventilators", 7);
    let ventilators_id = ventilators.id;
    println!("  Order: 7 ventilators (${:.0})", ventilators.magnitude);
    println!("    → {}", describe(&engine.propose_action(ventilators)?));

    let record = engine.decide(ventilators_id, procurement_manager(), Verdict::Approve, None)?;
    println!("    procurement_manager approves → {} ({}/2)", record.status, record.approval_count());
    let record = engine.decide(
        ventilators_id,
        finance_manager(),
        Verdict::Approve,
        Some("within quarterly capital budget".to_string()),
    )?;
    println!("    finance_manager approves     → {} (execution {:?})", record.status, record.execution);
    println!();

    // ── 3. Designated approver ────────────────────────────────────────────────

    let fleet = purchase_order("ventilators", 15);
    let fleet_id = fleet.id;
    println!("  Order: 15 ventilators (${:.0})", fleet.magnitude);
    println!("    → {}", describe(&engine.propose_action(fleet)?));

    let record = engine.decide(fleet_id, finance_manager(), Verdict::Approve, None)?;
    println!("    finance_manager approves     → {} (chief_medical_officer still required)", record.status);
    let record = engine.decide(fleet_id, chief_medical_officer(), Verdict::Approve, None)?;
    println!("    chief_medical_officer approves → {} (execution {:?})", record.status, record.execution);
    println!();

    // ── 4. Rejection ──────────────────────────────────────────────────────────

    let ppe = purchase_order("ppe_kits", 200);
    let ppe_id = ppe.id;
    println!("  Order: 200 PPE kits (${:.0})", ppe.magnitude);
    println!("    → {}", describe(&engine.propose_action(ppe)?));
    match engine.decide(ppe_id, Actor::new(QUARTERMASTER), Verdict::Approve, None) {
        Err(err @ GovernanceError::Unauthorized { .. }) => {
            println!("    quartermaster self-approves  → REFUSED: {}", err);
        }
        Err(other) => return Err(other),
        Ok(record) => println!("    quartermaster self-approves  → {}", record.status),
    }
    let record = engine.decide(
        ppe_id,
        finance_manager(),
        Verdict::Reject,
        Some("duplicate of last week's order".to_string()),
    )?;
    println!("    finance_manager rejects      → {}", record.status);
    println!();

    // ── 5. Vendor outage ──────────────────────────────────────────────────────

    runtime.executor.take_vendor_offline("vendor_b");
    let fluids = purchase_order("iv_fluids", 100);
    println!("  Order: 100 IV fluid packs (${:.0}) with vendor_b offline", fluids.magnitude);
    match engine.propose_action(fluids) {
        Err(GovernanceError::ExecutionFailed { reason, .. }) => {
            println!("    → EXECUTION FAILED: {} (agent must re-propose)", reason);
        }
        Err(other) => return Err(other),
        Ok(disposition) => println!("    → {}", describe(&disposition)),
    }
    println!();

    println!("  Orders placed:          {}", runtime.executor.executed().len());
    print_audit_summary(runtime);
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
