//! TOML-driven risk classifier implementation.
//!
//! `ThresholdClassifier` loads a `PolicyConfig` from a TOML string or file
//! and implements the `RiskClassifier` trait from tollgate-core.
//!
//! Classification algorithm:
//!
//! 1. Look up the rule for the action kind. No rule → `UnknownActionKind`.
//! 2. Return the tier of the first band whose `max` is not exceeded.
//! 3. Above every band → the rule's overflow tier.
//!
//! The quorum comes from the kind's own `approvals` override for the tier
//! when it has one, and from the global `[approvals]` table otherwise.
//!
//! Configuration is validated once at load time, so classification itself
//! cannot fail for a configured kind.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use tollgate_contracts::{
    action::ActionKind,
    error::{GovernanceError, GovernanceResult},
    tier::{ApprovalRequirement, RiskTier},
};
use tollgate_core::traits::RiskClassifier;

use crate::rule::{KindRule, PolicyConfig};

/// Environment variable naming a policy file that replaces the bundled one.
pub const POLICY_PATH_ENV: &str = "TOLLGATE_POLICY_PATH";

const BUNDLED_POLICY: &str = include_str!("../policies/hospital_default.toml");

/// A `RiskClassifier` that maps magnitudes to tiers through per-kind bands.
///
/// ```rust,ignore
/// use tollgate_policy::ThresholdClassifier;
///
/// let classifier = ThresholdClassifier::from_env()?;
/// let tier = classifier.classify(&ActionKind::PurchaseOrder, 300_000.0)?;
/// ```
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    config: PolicyConfig,
    by_kind: HashMap<ActionKind, usize>,
}

impl ThresholdClassifier {
    /// Validate `config` and index its rules by kind.
    ///
    /// Returns `GovernanceError::ConfigError` if a kind appears twice, has no
    /// bands, has bands that are not strictly ascending in both `max` and
    /// tier, names an overflow tier below its last band, or overrides a
    /// quorum with an empty approver role.
    pub fn from_config(config: PolicyConfig) -> GovernanceResult<Self> {
        let mut by_kind = HashMap::with_capacity(config.kinds.len());
        for (index, rule) in config.kinds.iter().enumerate() {
            validate_rule(rule)?;
            if by_kind.insert(rule.kind.clone(), index).is_some() {
                return Err(config_error(format!("kind '{}' is configured more than once", rule.kind)));
            }
        }

        debug!(kinds = by_kind.len(), "classification policy loaded");
        Ok(Self { config, by_kind })
    }

    /// Parse `s` as TOML and build a `ThresholdClassifier`.
    pub fn from_toml_str(s: &str) -> GovernanceResult<Self> {
        let config: PolicyConfig = toml::from_str(s)
            .map_err(|e| config_error(format!("failed to parse policy TOML: {}", e)))?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as TOML policy configuration.
    ///
    /// A missing or unreadable file is a `ConfigError`; there is no silent
    /// fallback to the bundled policy.
    pub fn from_file(path: &Path) -> GovernanceResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            config_error(format!("failed to read policy file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// The default hospital policy compiled into the crate.
    pub fn bundled() -> GovernanceResult<Self> {
        Self::from_toml_str(BUNDLED_POLICY)
    }

    /// Load the file named by `TOLLGATE_POLICY_PATH`, or the bundled policy
    /// when the variable is unset.
    pub fn from_env() -> GovernanceResult<Self> {
        match std::env::var_os(POLICY_PATH_ENV) {
            Some(path) => {
                let path = Path::new(&path);
                info!(path = %path.display(), "loading classification policy from file");
                Self::from_file(path)
            }
            None => Self::bundled(),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// The rule for `kind`, if configured.
    pub fn rule(&self, kind: &ActionKind) -> Option<&KindRule> {
        self.by_kind.get(kind).map(|&index| &self.config.kinds[index])
    }

    /// Configured kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &ActionKind> {
        self.config.kinds.iter().map(|rule| &rule.kind)
    }

    /// Every inline payload schema, keyed by kind.
    pub fn payload_schemas(&self) -> Vec<(ActionKind, serde_json::Value)> {
        self.config
            .kinds
            .iter()
            .filter_map(|rule| {
                rule.payload_schema
                    .as_ref()
                    .map(|schema| (rule.kind.clone(), schema.clone()))
            })
            .collect()
    }

    /// Roles allowed to operate the kill switch.
    pub fn operator_roles(&self) -> &[String] {
        &self.config.kill_switch.operator_roles
    }
}

impl RiskClassifier for ThresholdClassifier {
    fn classify(&self, kind: &ActionKind, magnitude: f64) -> GovernanceResult<RiskTier> {
        let rule = self.rule(kind).ok_or_else(|| GovernanceError::UnknownActionKind {
            kind: kind.to_string(),
        })?;
        let tier = rule.tier_for(magnitude);
        debug!(kind = %kind, magnitude, tier = %tier, "classified action");
        Ok(tier)
    }

    fn requirement(&self, kind: &ActionKind, tier: RiskTier) -> ApprovalRequirement {
        self.rule(kind)
            .and_then(|rule| rule.approvals.for_tier(tier))
            .unwrap_or_else(|| self.config.approvals.for_tier(tier))
            .clone()
    }

    fn explain(&self, kind: &ActionKind, magnitude: f64, tier: RiskTier) -> String {
        match self.rule(kind) {
            Some(rule) => rule.rationale(magnitude),
            None => format!("{} {} classified {}", kind, magnitude, tier),
        }
    }
}

fn validate_rule(rule: &KindRule) -> GovernanceResult<()> {
    if rule.kind.as_str().trim().is_empty() {
        return Err(config_error("kind name must not be empty".to_string()));
    }
    let Some(last) = rule.bands.last() else {
        return Err(config_error(format!("kind '{}' has no bands", rule.kind)));
    };

    for band in &rule.bands {
        if !band.max.is_finite() || band.max < 0.0 {
            return Err(config_error(format!(
                "kind '{}' has a band with invalid max {}",
                rule.kind, band.max
            )));
        }
    }
    for pair in rule.bands.windows(2) {
        if pair[1].max <= pair[0].max {
            return Err(config_error(format!(
                "kind '{}' bands must have strictly ascending max values ({} then {})",
                rule.kind, pair[0].max, pair[1].max
            )));
        }
        if pair[1].tier <= pair[0].tier {
            return Err(config_error(format!(
                "kind '{}' bands must have strictly ascending tiers ({} then {})",
                rule.kind, pair[0].tier, pair[1].tier
            )));
        }
    }

    for tier in RiskTier::ALL {
        let role = rule
            .approvals
            .for_tier(tier)
            .and_then(|requirement| requirement.approver_role.as_deref());
        if role.is_some_and(|role| role.trim().is_empty()) {
            return Err(config_error(format!(
                "kind '{}' {} approval override names an empty approver_role",
                rule.kind, tier
            )));
        }
    }

    if let Some(overflow) = rule.overflow {
        if overflow < last.tier {
            return Err(config_error(format!(
                "kind '{}' overflow tier {} is below its last band tier {}",
                rule.kind, overflow, last.tier
            )));
        }
    }
    Ok(())
}

fn config_error(reason: String) -> GovernanceError {
    GovernanceError::ConfigError { reason }
}
