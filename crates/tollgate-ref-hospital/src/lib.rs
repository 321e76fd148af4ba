//! # tollgate-ref-hospital
//!
//! Hospital reference runtime for the Tollgate governance engine.
//!
//! Demonstrates three scenarios using mock data:
//!
//! 1. **Quartermaster Procurement**: cost-tiered purchase orders, two-person
//!    approval, a designated approver, rejection and a vendor outage.
//! 2. **Press Secretary Advisories**: recipient-tiered patient advisories,
//!    payload checks that keep medical advice out, unknown kinds, expiry.
//! 3. **Kill Switch Drill**: blocking, deferred approval and resumption.
//!
//! All data is hardcoded and fictional. No external API calls are made.

pub mod executor;
pub mod mock_data;
pub mod runtime;
pub mod scenarios;

pub use executor::HospitalExecutor;
pub use runtime::HospitalRuntime;
