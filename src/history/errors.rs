//! History error types
//!
//! Corruption on load is reported with the byte offset of the broken
//! frame; a checksum mismatch is never silently skipped.

use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// History sink errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Underlying file I/O failed.
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be serialized or deserialized.
    #[error("history serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored frame failed its length or checksum validation.
    #[error("history corruption at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    /// Sink lock poisoned by a panicking writer.
    #[error("history sink lock poisoned")]
    Poisoned,
}

impl HistoryError {
    /// Creates a corruption error at the given byte offset.
    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        HistoryError::Corruption {
            offset,
            reason: reason.into(),
        }
    }
}
