//! # tollgate-contracts
//!
//! Shared types, dispositions and errors for the Tollgate governance engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions and error types.

pub mod action;
pub mod approval;
pub mod error;
pub mod execution;
pub mod kill_switch;
pub mod tier;
