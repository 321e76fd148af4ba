//! Simulated hospital data for the Tollgate reference runtime.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. Vendors, prices and staff stand in for the procurement, rostering
//! and patient-contact systems of a real deployment.

use serde_json::json;

use tollgate_contracts::action::{Action, ActionKind, Actor};

// ── Vendors and pricing (mock) ────────────────────────────────────────────────

/// A supplier the quartermaster may order from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: &'static str,
    pub name: &'static str,
    pub contact: &'static str,
}

pub static VENDORS: [Vendor; 3] = [
    Vendor { id: "vendor_a", name: "MedSupply Co", contact: "+91-1234567890" },
    Vendor { id: "vendor_b", name: "HealthCare Supplies", contact: "+91-9876543210" },
    Vendor { id: "vendor_c", name: "Medical Equipment Pro", contact: "+91-5555555555" },
];

/// Pick the supplier for `item`.
///
/// Oxygen goes to vendor A, IV fluids to vendor B, everything else to C.
pub fn supplier_for_item(item: &str) -> &'static Vendor {
    let item = item.to_lowercase();
    if item.contains("oxygen") {
        &VENDORS[0]
    } else if item.contains("iv") || item.contains("fluid") {
        &VENDORS[1]
    } else {
        &VENDORS[2]
    }
}

/// Unit price in USD. Unlisted items cost 1000.
pub fn unit_price(item: &str) -> f64 {
    match item {
        "oxygen_cylinders" => 5000.0,
        "iv_fluids" => 200.0,
        "ppe_kits" => 500.0,
        "ventilators" => 45000.0,
        _ => 1000.0,
    }
}

// ── Proposed actions ──────────────────────────────────────────────────────────

/// The quartermaster's purchase order for a supply shortage.
///
/// Magnitude is the total cost: `unit_price(item) * shortage`.
pub fn purchase_order(item: &str, shortage: u32) -> Action {
    let vendor = supplier_for_item(item);
    let cost = unit_price(item) * f64::from(shortage);
    Action::new(
        ActionKind::PurchaseOrder,
        cost,
        json!({
            "item": item,
            "quantity": shortage,
            "vendor": vendor.id,
            "vendor_name": vendor.name,
            "urgency": if shortage > 50 { "HIGH" } else { "MEDIUM" },
        }),
        QUARTERMASTER,
    )
}

/// The quartermaster's overtime request: eight hours per missing staff member.
pub fn staffing_change(role: &str, department: &str, shortage: u32) -> Action {
    let overtime_hours = f64::from(shortage * 8);
    Action::new(
        ActionKind::StaffingChange,
        overtime_hours,
        json!({
            "role": role,
            "department": department,
            "shortage": shortage,
            "temp_staff_count": shortage,
        }),
        QUARTERMASTER,
    )
}

/// The press secretary's patient advisory. Magnitude is the recipient count.
pub fn patient_advisory(advisory_type: &str, recipients: u32, message: &str) -> Action {
    Action::new(
        ActionKind::PatientAdvisory,
        f64::from(recipients),
        json!({
            "advisory_type": advisory_type,
            "recipient_count": recipients,
            "message": message,
        }),
        PRESS_SECRETARY,
    )
}

/// Stock moved between facilities. Magnitude is the value moved in USD.
pub fn inventory_transfer(item: &str, from: &str, to: &str, value: f64) -> Action {
    Action::new(
        ActionKind::InventoryTransfer,
        value,
        json!({ "item": item, "from": from, "to": to }),
        QUARTERMASTER,
    )
}

// ── Advisory content checks ───────────────────────────────────────────────────

const PRESCRIPTION_KEYWORDS: [&str; 11] = [
    "take", "medication", "dosage", "mg", "tablet", "prescription", "drug", "medicine", "pill",
    "dose", "inject",
];

/// Return true if `message` reads like medical advice rather than a public
/// advisory. Such messages must never be sent by an agent.
pub fn contains_medical_prescription(message: &str) -> bool {
    let message = message.to_lowercase();
    message
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| PRESCRIPTION_KEYWORDS.contains(&word))
}

// ── People ────────────────────────────────────────────────────────────────────

pub const QUARTERMASTER: &str = "quartermaster-agent";
pub const PRESS_SECRETARY: &str = "press-secretary-agent";

pub fn procurement_manager() -> Actor {
    Actor::with_role("p.iyer", "procurement_manager")
}

pub fn finance_manager() -> Actor {
    Actor::with_role("r.menon", "finance_manager")
}

pub fn communications_manager() -> Actor {
    Actor::with_role("a.khan", "communications_manager")
}

pub fn chief_medical_officer() -> Actor {
    Actor::with_role("dr.rao", "chief_medical_officer")
}

pub fn system_administrator() -> Actor {
    Actor::with_role("ops.lead", "system_administrator")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_mapping() {
        assert_eq!(supplier_for_item("oxygen_cylinders").id, "vendor_a");
        assert_eq!(supplier_for_item("iv_fluids").id, "vendor_b");
        assert_eq!(supplier_for_item("ppe_kits").id, "vendor_c");
    }

    #[test]
    fn test_purchase_order_cost_is_magnitude() {
        let po = purchase_order("oxygen_cylinders", 6);
        assert_eq!(po.magnitude, 30_000.0);
        assert_eq!(po.payload["vendor"], "vendor_a");
        assert_eq!(po.proposer, QUARTERMASTER);
    }

    #[test]
    fn test_staffing_hours() {
        assert_eq!(staffing_change("nurse", "icu", 3).magnitude, 24.0);
    }

    /// Whole words only: "takeaway" and "tablets" do not match, "take" does.
    #[test]
    fn test_prescription_language_detection() {
        assert!(contains_medical_prescription("Please take 500 mg paracetamol"));
        assert!(contains_medical_prescription("Continue your MEDICATION as usual"));
        assert!(!contains_medical_prescription("Air quality is poor; stay indoors."));
        assert!(!contains_medical_prescription("Takeaway counters remain open"));
    }
}
