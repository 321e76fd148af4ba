//! Mock hospital executor.
//!
//! `HospitalExecutor` stands in for the vendor API, the rostering system and
//! the SMS gateway. It never contacts anything; it records every action it was
//! asked to perform so scenarios can show exactly what reached the world.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::info;

use tollgate_contracts::{
    action::{Action, ActionId, ActionKind},
    error::{GovernanceError, GovernanceResult},
};
use tollgate_core::traits::ActionExecutor;

/// Records executed actions. Clones share the same record.
#[derive(Clone, Default)]
pub struct HospitalExecutor {
    executed: Arc<Mutex<Vec<Action>>>,
    offline_vendors: Arc<Mutex<HashSet<String>>>,
}

impl HospitalExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every purchase order to `vendor_id` fail, as if its API were down.
    pub fn take_vendor_offline(&self, vendor_id: impl Into<String>) {
        self.offline_vendors.lock().insert(vendor_id.into());
    }

    /// Everything executed so far, in execution order.
    pub fn executed(&self) -> Vec<Action> {
        self.executed.lock().clone()
    }

    /// How many times `action_id` was executed.
    pub fn times_executed(&self, action_id: ActionId) -> usize {
        self.executed.lock().iter().filter(|a| a.id == action_id).count()
    }
}

impl ActionExecutor for HospitalExecutor {
    fn execute(&self, action: &Action) -> GovernanceResult<serde_json::Value> {
        let short_id = action.id.0.simple().to_string()[..8].to_uppercase();

        let outcome = match &action.kind {
            ActionKind::PurchaseOrder => {
                let vendor = action.payload["vendor"].as_str().unwrap_or("unknown");
                if self.offline_vendors.lock().contains(vendor) {
                    return Err(GovernanceError::ExecutionFailed {
                        action_id: action.id,
                        reason: format!("vendor '{}' did not acknowledge the order", vendor),
                    });
                }
                json!({
                    "order_id": format!("PO-{}", short_id),
                    "status": "PLACED",
                    "vendor": vendor,
                    "cost": action.magnitude,
                })
            }
            ActionKind::StaffingChange => json!({
                "roster_change_id": format!("RC-{}", short_id),
                "status": "SCHEDULED",
                "overtime_hours": action.magnitude,
            }),
            ActionKind::PatientAdvisory => json!({
                "status": "SENT",
                "sent": action.magnitude,
                "failed": 0,
            }),
            ActionKind::InventoryTransfer => json!({
                "transfer_id": format!("TR-{}", short_id),
                "status": "DISPATCHED",
            }),
            ActionKind::Custom(kind) => {
                return Err(GovernanceError::ExecutionFailed {
                    action_id: action.id,
                    reason: format!("no hospital system handles '{}'", kind),
                });
            }
        };

        info!(action_id = %action.id, kind = %action.kind, "hospital system performed action");
        self.executed.lock().push(action.clone());
        Ok(outcome)
    }
}
