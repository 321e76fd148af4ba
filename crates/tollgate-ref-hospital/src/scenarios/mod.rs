//! Reference hospital scenarios.
//!
//! Each scenario wires a fresh `HospitalRuntime` and walks one governance
//! pattern end to end with mock hospital data, printing every disposition and
//! verifying the audit chain at the end.

pub mod advisory;
pub mod kill_switch_drill;
pub mod procurement;

use tollgate_contracts::execution::Disposition;

use crate::runtime::HospitalRuntime;

/// One-line summary of a disposition for scenario output.
pub(crate) fn describe(disposition: &Disposition) -> String {
    match disposition {
        Disposition::Executed { tier, record, .. } => {
            format!("EXECUTED ({:?}) at tier {}", record.execution_type, tier)
        }
        Disposition::AwaitingApproval { tier, required_approvals, .. } => {
            format!("AWAITING APPROVAL at tier {} ({})", tier, required_approvals)
        }
        Disposition::Blocked { tier, reason, activated_by, .. } => {
            format!("BLOCKED at tier {} by kill switch ({}, thrown by {})", tier, reason, activated_by)
        }
    }
}

/// Print the audit chain summary that closes every scenario.
pub(crate) fn print_audit_summary(runtime: &HospitalRuntime) {
    let log = runtime.audit.export_log();
    println!(
        "  Audit chain integrity:  {} ({} event(s), terminal hash {})",
        if runtime.audit.verify_integrity() { "VERIFIED" } else { "FAILED" },
        log.events.len(),
        log.terminal_hash.get(..12).unwrap_or("-"),
    );
    println!("  Activity feed:          {} notification(s)", runtime.feed.len());
}
