//! Proposed actions and the actors that decide on them.
//!
//! An `Action` is what an agent hands to the governance engine. Tollgate
//! reads only `kind` and `magnitude` to make its decision; the `payload` is
//! carried through untouched for the executor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a single proposed action.
///
/// Assigned once at proposal time and used as the only key by the ledger,
/// the audit trail and notification correlation. Never reused: a retried
/// action is a new proposal with a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub uuid::Uuid);

impl ActionId {
    /// Create a new, unique action ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action_{}", self.0.simple())
    }
}

/// The category of a proposed action.
///
/// The four hospital-operations kinds are built in. Any other name parses
/// into `Custom`, which is only usable if the classifier configuration
/// declares a rule for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    PurchaseOrder,
    StaffingChange,
    PatientAdvisory,
    InventoryTransfer,
    Custom(String),
}

impl ActionKind {
    /// The canonical upper-snake-case name used in configuration and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PurchaseOrder => "PURCHASE_ORDER",
            Self::StaffingChange => "STAFFING_CHANGE",
            Self::PatientAdvisory => "PATIENT_ADVISORY",
            Self::InventoryTransfer => "INVENTORY_TRANSFER",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ActionKind {
    fn from(s: &str) -> Self {
        match s {
            "PURCHASE_ORDER" => Self::PurchaseOrder,
            "STAFFING_CHANGE" => Self::StaffingChange,
            "PATIENT_ADVISORY" => Self::PatientAdvisory,
            "INVENTORY_TRANSFER" => Self::InventoryTransfer,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ActionKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// A real-world operation an agent wants to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub kind: ActionKind,
    /// Kind-specific measure the classifier compares against its thresholds:
    /// cost for purchase orders, overtime hours for staffing changes,
    /// recipient count for advisories, value for inventory transfers.
    pub magnitude: f64,
    /// Executor-facing description of the action. Governance never reads it
    /// beyond optional structural validation.
    pub payload: serde_json::Value,
    /// The agent that proposed the action (e.g. "quartermaster").
    pub proposer: String,
    pub created_at: DateTime<Utc>,
}

impl Action {
    /// Build a new proposal with a fresh id and the current time.
    pub fn new(
        kind: impl Into<ActionKind>,
        magnitude: f64,
        payload: serde_json::Value,
        proposer: impl Into<String>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            kind: kind.into(),
            magnitude,
            payload,
            proposer: proposer.into(),
            created_at: Utc::now(),
        }
    }
}

/// A human (or service account) casting a decision or toggling the kill switch.
///
/// Identity is the `id`; `role` is what designated-role quorums and kill
/// switch operator checks look at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Option<String>,
}

impl Actor {
    /// An actor with no role.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: None }
    }

    /// An actor holding `role`.
    pub fn with_role(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self { id: id.into(), role: Some(role.into()) }
    }

    /// Return true if the actor holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Some(role) => write!(f, "{} ({})", self.id, role),
            None => f.write_str(&self.id),
        }
    }
}
