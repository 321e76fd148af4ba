//! Wiring for the reference hospital deployment.
//!
//! `HospitalRuntime::with_classifier()` assembles a `GovernanceEngine` from the real
//! Tollgate components (TOML classifier, payload verifier, hash-chained audit
//! sink, activity feed) and the mock hospital executor, keeping inspectable
//! handles to every collaborator the engine owns.

use tollgate_audit::{ActivityFeed, InMemoryAuditSink};
use tollgate_contracts::{action::ActionKind, error::GovernanceResult};
use tollgate_core::GovernanceEngine;
use tollgate_policy::ThresholdClassifier;
use tollgate_verify::PayloadSchemaVerifier;

use crate::{executor::HospitalExecutor, mock_data::contains_medical_prescription};

/// Audit stream name used by the reference deployment.
pub const AUDIT_STREAM: &str = "st-marys-governance";

pub struct HospitalRuntime {
    pub engine: GovernanceEngine,
    pub audit: InMemoryAuditSink,
    pub feed: ActivityFeed,
    pub executor: HospitalExecutor,
}

impl HospitalRuntime {
    /// Build a runtime around `classifier`, taking payload schemas and kill
    /// switch operator roles from the same policy.
    pub fn with_classifier(classifier: ThresholdClassifier) -> GovernanceResult<Self> {
        let mut verifier = PayloadSchemaVerifier::from_schemas(classifier.payload_schemas())?;
        verifier.register_check(
            ActionKind::PatientAdvisory,
            "no-medical-advice",
            Box::new(|payload| {
                let message = payload.get("message").and_then(|m| m.as_str()).unwrap_or("");
                contains_medical_prescription(message)
                    .then(|| "advisories must not contain prescription or dosage language".to_string())
            }),
        );

        let audit = InMemoryAuditSink::new(AUDIT_STREAM);
        let feed = ActivityFeed::new();
        let executor = HospitalExecutor::new();
        let operator_roles = classifier.operator_roles().to_vec();

        let engine = GovernanceEngine::new(
            Box::new(classifier),
            Box::new(executor.clone()),
            Box::new(audit.clone()),
        )
        .with_verifier(Box::new(verifier))
        .with_notifier(Box::new(feed.clone()))
        .with_operator_roles(operator_roles);

        Ok(Self { engine, audit, feed, executor })
    }
}
