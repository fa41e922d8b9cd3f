//! Store error types
//!
//! Three distinct failure classes, and the distinction is load-bearing:
//! transient failures are retried by the service layer, not-found surfaces
//! immediately, and programming errors mean the calling code misused a
//! handle. A programming error is never a domain outcome.

use thiserror::Error;

use crate::gauge::GaugeId;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row lock wait exceeded the configured timeout. Transient.
    #[error("lock wait timed out for gauge {0}")]
    LockTimeout(GaugeId),

    /// The lock provider reported two waiters blocking each other.
    /// Transient.
    #[error("deadlock detected while locking gauge {0}")]
    Deadlock(GaugeId),

    /// A row changed between the unlocked read and the locked re-read.
    /// Transient; the operation is retried from the top.
    #[error("gauge {0} changed before its lock was acquired")]
    Conflict(GaugeId),

    /// Referenced gauge does not exist or is soft-deleted.
    #[error("gauge {0} not found")]
    NotFound(GaugeId),

    /// Write attempted through a handle already committed or rolled back.
    #[error("transaction handle is closed")]
    TransactionClosed,

    /// Write attempted on a row whose lock this handle does not hold.
    #[error("row lock not held for gauge {0}")]
    LockNotHeld(GaugeId),

    /// History sink failure during commit. Nothing was applied.
    #[error("history append failed: {0}")]
    History(String),

    /// Table or lock state poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Transient failures may be retried with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::LockTimeout(_) | StoreError::Deadlock(_) | StoreError::Conflict(_)
        )
    }

    /// Programming errors indicate a bug in the caller, not in the data.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            StoreError::TransactionClosed | StoreError::LockNotHeld(_)
        )
    }
}
