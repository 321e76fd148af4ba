//! # tollgate-verify
//!
//! Payload verification for the Tollgate runtime.
//!
//! This crate provides [`payload::PayloadSchemaVerifier`], which implements
//! the [`tollgate_core::traits::PayloadVerifier`] trait. It validates action
//! payloads before classification in two phases:
//!
//! 1. **Structural**: JSON Schema validation via the `jsonschema` crate,
//!    one schema per action kind.
//! 2. **Custom**: named checks registered by the hosting application.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tollgate_verify::PayloadSchemaVerifier;
//!
//! let mut verifier = PayloadSchemaVerifier::from_schemas(classifier.payload_schemas())?;
//! verifier.register_check(ActionKind::PatientAdvisory, "no-mrn", Box::new(|payload| {
//!     let message = payload.get("message").and_then(|m| m.as_str()).unwrap_or("");
//!     message.contains("MRN").then(|| "advisories must not quote record numbers".to_string())
//! }));
//! ```

pub mod payload;

pub use payload::{CustomCheckFn, PayloadSchemaVerifier};
