//! Pairing and Cascade Services
//!
//! The sole mutation entry points for companion state. Every method runs
//! its repository calls inside exactly one transaction, threading the
//! handle explicitly, and retries only transient persistence failures.
//!
//! This module provides:
//! - `PairingService` - create / pair / unpair / replace workflows
//! - `CascadeService` - status, location, and deletion propagation
//! - `EngineError` - Unified error surface for service callers
//! - `ConsistencyWarning` - Data-integrity signal that never fails the
//!   triggering operation

mod cascade;
mod errors;
mod pairing;
mod retry;

pub use cascade::{CascadeOutcome, CascadeService, DeleteOutcome};
pub use errors::{ConsistencyIssue, ConsistencyWarning, EngineError, EngineResult};
pub use pairing::{CheckoutDecision, PairingService, UnpairOutcome};
pub use retry::with_retry;
