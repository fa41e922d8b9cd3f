//! Engine-level errors and integrity signals

use thiserror::Error;

use crate::gauge::GaugeId;
use crate::observability::{Event, Logger};
use crate::pair::{DomainValidationError, ValidationCode};
use crate::store::StoreError;

/// Result type for service operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Unified error surface for the pairing and cascade services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain validation rejected the operation. Never retried; no
    /// mutation occurred.
    #[error(transparent)]
    Validation(#[from] DomainValidationError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A transient persistence failure survived every retry attempt.
    #[error("operation failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    /// Whether the retry loop may run this operation again.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_transient())
    }

    /// The stable rejection code, when the error is a domain rejection.
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            EngineError::Validation(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// What went wrong with a companion pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// The pointer references a record that is missing or deleted.
    MissingCompanionRecord,
    /// The referenced record does not point back.
    AsymmetricLink,
}

impl ConsistencyIssue {
    /// Returns the issue name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyIssue::MissingCompanionRecord => "missing_companion_record",
            ConsistencyIssue::AsymmetricLink => "asymmetric_link",
        }
    }
}

/// Data-integrity signal raised when a companion pointer does not resolve
/// cleanly. The triggering operation still completes against whichever
/// record is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyWarning {
    /// The gauge the operation was invoked on.
    pub gauge_id: GaugeId,
    /// The companion the pointer named.
    pub companion_id: GaugeId,
    pub issue: ConsistencyIssue,
}

impl ConsistencyWarning {
    pub fn new(gauge_id: GaugeId, companion_id: GaugeId, issue: ConsistencyIssue) -> Self {
        Self {
            gauge_id,
            companion_id,
            issue,
        }
    }

    /// Emits the warning through the structured logger.
    pub fn log(&self) {
        Logger::warn(
            Event::ConsistencyWarning.as_str(),
            &[
                ("gauge_id", &self.gauge_id.to_string()),
                ("companion_id", &self.companion_id.to_string()),
                ("issue", self.issue.as_str()),
            ],
        );
    }
}
