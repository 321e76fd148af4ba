//! Payload verifier for the Tollgate runtime.
//!
//! `PayloadSchemaVerifier` implements the `PayloadVerifier` trait from
//! `tollgate-core`. Verification runs in two phases:
//!
//! 1. **Structural**: the payload is validated against the JSON Schema
//!    registered for the action kind, using the `jsonschema` crate.
//! 2. **Custom**: every named check registered for the kind runs in
//!    registration order.
//!
//! All failures are collected before returning so the proposing agent sees
//! the full failure set in one pass. Kinds with nothing registered pass.

use std::collections::HashMap;

use tracing::{debug, warn};

use tollgate_contracts::{
    action::ActionKind,
    error::{GovernanceError, GovernanceResult},
};
use tollgate_core::traits::PayloadVerifier;

/// A caller-supplied payload check.
///
/// Returns `Some(message)` when the check fails, `None` on success.
pub type CustomCheckFn = Box<dyn Fn(&serde_json::Value) -> Option<String> + Send + Sync>;

struct NamedCheck {
    name: String,
    check: CustomCheckFn,
}

/// Validates action payloads against per-kind schemas and custom checks.
///
/// Schemas are compiled once, when registered; a malformed schema document
/// is a `ConfigError` at that point rather than a verification failure
/// later.
#[derive(Default)]
pub struct PayloadSchemaVerifier {
    schemas: HashMap<ActionKind, jsonschema::Validator>,
    checks: HashMap<ActionKind, Vec<NamedCheck>>,
}

impl PayloadSchemaVerifier {
    /// Create a verifier with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register every `(kind, schema)` pair.
    pub fn from_schemas<I>(schemas: I) -> GovernanceResult<Self>
    where
        I: IntoIterator<Item = (ActionKind, serde_json::Value)>,
    {
        let mut verifier = Self::new();
        for (kind, schema) in schemas {
            verifier.add_schema(kind, &schema)?;
        }
        Ok(verifier)
    }

    /// Compile `schema` and register it for `kind`, replacing any previous
    /// schema for that kind.
    pub fn add_schema(&mut self, kind: ActionKind, schema: &serde_json::Value) -> GovernanceResult<()> {
        let validator = jsonschema::validator_for(schema).map_err(|e| GovernanceError::ConfigError {
            reason: format!("invalid payload schema for kind '{}': {}", kind, e),
        })?;
        debug!(kind = %kind, "payload schema registered");
        self.schemas.insert(kind, validator);
        Ok(())
    }

    /// Register a custom check for `kind` under `name`.
    ///
    /// The name prefixes the failure message so operators can tell checks
    /// apart.
    pub fn register_check(&mut self, kind: ActionKind, name: impl Into<String>, check: CustomCheckFn) {
        self.checks.entry(kind).or_default().push(NamedCheck {
            name: name.into(),
            check,
        });
    }

    /// Return true if anything is registered for `kind`.
    pub fn covers(&self, kind: &ActionKind) -> bool {
        self.schemas.contains_key(kind) || self.checks.contains_key(kind)
    }
}

impl PayloadVerifier for PayloadSchemaVerifier {
    fn verify(&self, kind: &ActionKind, payload: &serde_json::Value) -> Vec<String> {
        let mut failures = Vec::new();

        // ── Phase 1: JSON Schema structural validation ────────────────────────
        if let Some(validator) = self.schemas.get(kind) {
            for error in validator.iter_errors(payload) {
                let message = format!("payload schema violation at {}: {}", error.instance_path, error);
                warn!(kind = %kind, %message, "structural validation failure");
                failures.push(message);
            }
        }

        // ── Phase 2: Custom checks ────────────────────────────────────────────
        for named in self.checks.get(kind).into_iter().flatten() {
            if let Some(message) = (named.check)(payload) {
                let message = format!("{}: {}", named.name, message);
                warn!(kind = %kind, check = %named.name, %message, "payload check failed");
                failures.push(message);
            }
        }

        debug!(kind = %kind, failure_count = failures.len(), "payload verification complete");
        failures
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
