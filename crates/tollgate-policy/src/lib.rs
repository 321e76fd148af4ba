//! # tollgate-policy
//!
//! A TOML-driven risk classifier for the Tollgate runtime.
//!
//! ## Overview
//!
//! This crate provides [`ThresholdClassifier`], which implements the
//! [`RiskClassifier`](tollgate_core::traits::RiskClassifier) trait. Each
//! action kind declares ascending magnitude bands; the first band whose
//! `max` is not exceeded decides the tier. Kinds that are not configured are
//! refused, never defaulted.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tollgate_policy::ThresholdClassifier;
//!
//! // TOLLGATE_POLICY_PATH overrides the bundled hospital policy.
//! let classifier = ThresholdClassifier::from_env()?;
//! // Pass `classifier` to `tollgate_core::GovernanceEngine::new(...)`.
//! ```

pub mod classifier;
pub mod rule;

pub use classifier::{ThresholdClassifier, POLICY_PATH_ENV};
pub use rule::{ApprovalTable, KillSwitchPolicy, KindApprovals, KindRule, PolicyConfig, TierBand};

// ── Tests ─────────────────────────────────────────────────────────────────────
