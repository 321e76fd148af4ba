//! Scenario 2: Press Secretary Advisories
//!
//! The press secretary agent contacts at-risk patients during environmental
//! events. The recipient count decides the tier; payload checks keep medical
//! advice out of agent-written messages.
//!
//! Walk-through:
//!   1. Heatwave advisory to 1,500 patients → LOW, sent autonomously
//!   2. Pollution alert to 6,000 patients → above every band, HIGH, two approvals
//!   3. Advisory quoting a dosage → rejected by the payload check, nothing recorded
//!   4. Advisory without a message → rejected by the payload schema
//!   5. Unknown action kind → refused, never defaulted to a tier
//!   6. Flood advisory left pending past its window → expired
//!   7. Audit chain integrity verified at the end

use chrono::{Duration, Utc};
use serde_json::json;

use tollgate_contracts::{
    action::Action,
    approval::Verdict,
    error::{GovernanceError, GovernanceResult},
};

use crate::{
    mock_data::{chief_medical_officer, communications_manager, patient_advisory, PRESS_SECRETARY},
    runtime::HospitalRuntime,
    scenarios::{describe, print_audit_summary},
};

/// Run Scenario 2 on `runtime`.
pub fn run(runtime: &HospitalRuntime) -> GovernanceResult<()> {
    println!("=== Scenario 2: Press Secretary Advisories ===");
    println!();
    let engine = &runtime.engine;

    // ── 1. Small advisory ─────────────────────────────────────────────────────

    let heatwave = patient_advisory(
        "heatwave",
        1_500,
        "Temperatures above 42C expected tomorrow. Stay indoors between 11am and 4pm and drink water often.",
    );
    println!("  Advisory: heatwave, 1,500 recipients");
    println!("    → {}", describe(&engine.propose_action(heatwave)?));
    println!();

    // ── 2. City-wide alert ────────────────────────────────────────────────────

    let pollution = patient_advisory(
        "pollution_alert",
        6_000,
        "Air quality is severe today. Patients with asthma or COPD should avoid outdoor activity.",
    );
    let pollution_id = pollution.id;
    println!("  Advisory: pollution alert, 6,000 recipients");
    println!("    → {}", describe(&engine.propose_action(pollution)?));
    engine.decide(pollution_id, communications_manager(), Verdict::Approve, None)?;
    let record = engine.decide(pollution_id, chief_medical_officer(), Verdict::Approve, None)?;
    println!("    communications_manager + chief_medical_officer approve → {}", record.status);
    println!();

    // ── 3–5. Refused before classification ────────────────────────────────────

    let dosage = patient_advisory(
        "heatwave",
        800,
        "Take 500 mg paracetamol if you develop a fever.",
    );
    let missing_message = Action::new(
        "PATIENT_ADVISORY",
        200.0,
        json!({ "advisory_type": "flood" }),
        PRESS_SECRETARY,
    );
    let teleport = Action::new("TELEPORT", 1.0, json!({}), PRESS_SECRETARY);

    for (label, action) in [
        ("advisory quoting a dosage", dosage),
        ("advisory without a message", missing_message),
        ("TELEPORT action", teleport),
    ] {
        println!("  Proposal: {}", label);
        match engine.propose_action(action) {
            Err(err @ GovernanceError::InvalidAction { .. })
            | Err(err @ GovernanceError::UnknownActionKind { .. }) => {
                println!("    → REFUSED: {}", err);
            }
            Err(other) => return Err(other),
            Ok(disposition) => println!("    → {}", describe(&disposition)),
        }
    }
    println!();

    // ── 6. Expiry ─────────────────────────────────────────────────────────────

    let flood = patient_advisory(
        "flood",
        3_000,
        "Roads around the east wing are flooded. Use the north entrance for appointments.",
    );
    println!("  Advisory: flood notice, 3,000 recipients");
    println!("    → {}", describe(&engine.propose_action(flood)?));
    let expired = engine.expire_older_than(Utc::now() + Duration::seconds(1));
    println!("    approval window elapsed      → {} record(s) EXPIRED", expired.len());
    println!();

    println!("  Advisories sent:        {}", runtime.executor.executed().len());
    print_audit_summary(runtime);
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use tollgate_contracts::{
        action::ActionKind,
        execution::ExecutionType,
        tier::RiskTier,
    };
    use tollgate_policy::ThresholdClassifier;

    use super::run;
    use crate::runtime::HospitalRuntime;

    fn runtime() -> HospitalRuntime {
        HospitalRuntime::with_classifier(ThresholdClassifier::bundled().unwrap()).unwrap()
    }

    #[test]
    fn test_advisory_scenario_runs() {
        let runtime = runtime();
        run(&runtime).unwrap();

        let executed = runtime.executor.executed();
        assert_eq!(executed.len(), 2);
        assert!(executed.iter().all(|a| a.kind == ActionKind::PatientAdvisory));

        let records = runtime.audit.execution_records();
        let summary: Vec<(ExecutionType, RiskTier)> =
            records.iter().map(|r| (r.execution_type, r.tier)).collect();
        assert_eq!(
            summary,
            vec![
                (ExecutionType::Autonomous, RiskTier::Low),
                (ExecutionType::Approved, RiskTier::High),
                (ExecutionType::Expired, RiskTier::Medium),
            ]
        );
        assert!(runtime.audit.verify_integrity());
    }

    /// Refused proposals leave no trace in the audit chain.
    #[test]
    fn test_refused_proposals_are_not_audited() {
        let runtime = runtime();
        run(&runtime).unwrap();
        assert!(runtime
            .audit
            .execution_records()
            .iter()
            .all(|r| r.kind == ActionKind::PatientAdvisory));
        assert_eq!(runtime.audit.len(), 3);
    }
}
