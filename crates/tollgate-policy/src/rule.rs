//! Trust boundary rule types and configuration schema.
//!
//! A `PolicyConfig` is deserialized from TOML. It holds one `KindRule` per
//! action kind, the approval quorum for each tier, and the kill switch
//! operator roles. A kind may override the quorum for any tier, typically to
//! name the role accountable for that kind (procurement, HR, comms).

use serde::{Deserialize, Serialize};

use tollgate_contracts::{
    action::ActionKind,
    tier::{ApprovalRequirement, RiskTier},
};

/// One magnitude band: values up to and including `max` map to `tier`.
///
/// Example in TOML:
/// ```toml
/// bands = [{ max = 50000, tier = "low" }, { max = 200000, tier = "medium" }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    pub max: f64,
    pub tier: RiskTier,
}

/// The classification rule for a single action kind.
///
/// Bands must be strictly ascending in both `max` and `tier`. A magnitude
/// above the last band resolves to `overflow`, or to the tier after the last
/// band's tier when `overflow` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindRule {
    /// The action kind this rule governs, e.g. `"PURCHASE_ORDER"`.
    pub kind: ActionKind,

    /// Human-readable explanation of what this kind covers.
    #[serde(default)]
    pub description: String,

    /// What the magnitude measures (`"usd"`, `"hours"`, `"recipients"`).
    #[serde(default)]
    pub unit: Option<String>,

    pub bands: Vec<TierBand>,

    #[serde(default)]
    pub overflow: Option<RiskTier>,

    /// Per-tier quorum overrides for this kind.
    #[serde(default)]
    pub approvals: KindApprovals,

    /// Optional JSON Schema every payload of this kind must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_schema: Option<serde_json::Value>,
}

impl KindRule {
    /// The tier for `magnitude` under this rule.
    pub fn tier_for(&self, magnitude: f64) -> RiskTier {
        self.bands
            .iter()
            .find(|band| magnitude <= band.max)
            .map(|band| band.tier)
            .unwrap_or_else(|| self.overflow_tier())
    }

    /// The tier for magnitudes above every band.
    pub fn overflow_tier(&self) -> RiskTier {
        self.overflow.unwrap_or_else(|| {
            self.bands
                .last()
                .map(|band| band.tier.successor())
                .unwrap_or(RiskTier::Critical)
        })
    }

    /// Name the band limit that put `magnitude` in its tier, e.g.
    /// "PURCHASE_ORDER 300000 usd exceeds the MEDIUM limit of 200000".
    pub fn rationale(&self, magnitude: f64) -> String {
        let measured = match &self.unit {
            Some(unit) => format!("{} {} {}", self.kind, magnitude, unit),
            None => format!("{} {}", self.kind, magnitude),
        };
        match self.bands.iter().position(|band| magnitude <= band.max) {
            Some(0) => format!(
                "{} within the {} limit of {}",
                measured, self.bands[0].tier, self.bands[0].max
            ),
            Some(index) => {
                let below = &self.bands[index - 1];
                format!("{} exceeds the {} limit of {}", measured, below.tier, below.max)
            }
            None => match self.bands.last() {
                Some(last) => format!(
                    "{} exceeds every band (last limit {}); overflow tier {}",
                    measured,
                    last.max,
                    self.overflow_tier()
                ),
                None => format!("{} has no bands; overflow tier {}", measured, self.overflow_tier()),
            },
        }
    }
}

/// Optional per-tier quorum overrides on a single kind.
///
/// Example in TOML:
/// ```toml
/// [kinds.approvals.medium]
/// approvals = 1
/// approver_role = "procurement_manager"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindApprovals {
    pub low: Option<ApprovalRequirement>,
    pub medium: Option<ApprovalRequirement>,
    pub high: Option<ApprovalRequirement>,
    pub critical: Option<ApprovalRequirement>,
}

impl KindApprovals {
    pub fn for_tier(&self, tier: RiskTier) -> Option<&ApprovalRequirement> {
        match tier {
            RiskTier::Low => self.low.as_ref(),
            RiskTier::Medium => self.medium.as_ref(),
            RiskTier::High => self.high.as_ref(),
            RiskTier::Critical => self.critical.as_ref(),
        }
    }
}

/// The approval quorum for each tier.
///
/// Tiers missing from the TOML fall back to: LOW autonomous, MEDIUM one
/// approval, HIGH two, CRITICAL one from the chief medical officer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalTable {
    pub low: ApprovalRequirement,
    pub medium: ApprovalRequirement,
    pub high: ApprovalRequirement,
    pub critical: ApprovalRequirement,
}

impl Default for ApprovalTable {
    fn default() -> Self {
        Self {
            low: ApprovalRequirement::count(0),
            medium: ApprovalRequirement::count(1),
            high: ApprovalRequirement::count(2),
            critical: ApprovalRequirement::with_role(1, "chief_medical_officer"),
        }
    }
}

impl ApprovalTable {
    pub fn for_tier(&self, tier: RiskTier) -> &ApprovalRequirement {
        match tier {
            RiskTier::Low => &self.low,
            RiskTier::Medium => &self.medium,
            RiskTier::High => &self.high,
            RiskTier::Critical => &self.critical,
        }
    }
}

/// Who may throw or release the kill switch. Empty means any named actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchPolicy {
    #[serde(default)]
    pub operator_roles: Vec<String>,
}

/// The top-level structure deserialized from a TOML policy file.
///
/// Example:
/// ```toml
/// [approvals.high]
/// approvals = 2
///
/// [[kinds]]
/// kind = "PATIENT_ADVISORY"
/// unit = "recipients"
/// bands = [{ max = 2000, tier = "low" }, { max = 5000, tier = "medium" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub approvals: ApprovalTable,

    #[serde(default)]
    pub kill_switch: KillSwitchPolicy,

    pub kinds: Vec<KindRule>,
}
