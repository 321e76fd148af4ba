//! # tollgate-core
//!
//! The trust boundary between hospital agents and the real world.
//!
//! This crate provides:
//! - The collaborator traits (`RiskClassifier`, `PayloadVerifier`,
//!   `ActionExecutor`, `AuditSink`, `NotificationSink`)
//! - The `KillSwitch`, an explicitly shared emergency stop
//! - The `ApprovalLedger` of actions awaiting human approval
//! - The `GovernanceEngine` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_core::{GovernanceEngine, KillSwitch, traits::{RiskClassifier, ActionExecutor, AuditSink}};
//! ```

pub mod engine;
pub mod kill_switch;
pub mod ledger;
pub mod traits;

pub use engine::{GovernanceEngine, Rescan, Resumption};
pub use kill_switch::{ExecutionPermit, KillSwitch};
pub use ledger::ApprovalLedger;
