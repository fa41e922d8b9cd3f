//! Domain validation errors
//!
//! Every rejection carries a stable code and the offending field values as
//! metadata. Domain rejections are never retried and never leave partial
//! state behind; validation runs before any write.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type for domain validation.
pub type ValidationResult<T> = Result<T, DomainValidationError>;

/// Stable rejection codes surfaced to callers verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// A participating record is soft-deleted.
    GaugeDeleted,
    /// Suffixes are not exactly one GO and one NOGO.
    SuffixInvalid,
    /// Equipment types differ.
    TypeMismatch,
    /// Categories differ.
    CategoryMismatch,
    /// Specification snapshots differ on a comparison field.
    SpecMismatch,
    /// Ownership kinds differ, or customers differ.
    OwnershipMismatch,
    /// Companion references are not mutually symmetric.
    AsymmetricLink,
    /// The equipment type never pairs.
    NptCompanionForbidden,
    /// The gauge already has a companion.
    NotASpare,
    /// The gauge has no companion.
    NotPaired,
    /// The gauge or its companion is out with a job.
    CompanionCheckedOut,
    /// The replacement candidate has not cleared incoming QC.
    ReplacementPendingQc,
    /// The requested status cannot be cascaded.
    StatusNotCascadable,
}

impl ValidationCode {
    /// Returns the stable code string.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationCode::GaugeDeleted => "GAUGE_DELETED",
            ValidationCode::SuffixInvalid => "SUFFIX_INVALID",
            ValidationCode::TypeMismatch => "TYPE_MISMATCH",
            ValidationCode::CategoryMismatch => "CATEGORY_MISMATCH",
            ValidationCode::SpecMismatch => "SPEC_MISMATCH",
            ValidationCode::OwnershipMismatch => "OWNERSHIP_MISMATCH",
            ValidationCode::AsymmetricLink => "ASYMMETRIC_LINK",
            ValidationCode::NptCompanionForbidden => "NPT_COMPANION_FORBIDDEN",
            ValidationCode::NotASpare => "NOT_A_SPARE",
            ValidationCode::NotPaired => "NOT_PAIRED",
            ValidationCode::CompanionCheckedOut => "COMPANION_CHECKED_OUT",
            ValidationCode::ReplacementPendingQc => "REPLACEMENT_PENDING_QC",
            ValidationCode::StatusNotCascadable => "STATUS_NOT_CASCADABLE",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A rejected domain operation.
///
/// No mutation has occurred when one of these is returned.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainValidationError {
    code: ValidationCode,
    message: String,
    fields: Value,
}

impl DomainValidationError {
    /// Creates a rejection with offending-field metadata.
    pub fn new(code: ValidationCode, message: impl Into<String>, fields: Value) -> Self {
        Self {
            code,
            message: message.into(),
            fields,
        }
    }

    /// Returns the stable rejection code.
    pub fn code(&self) -> ValidationCode {
        self.code
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field values.
    pub fn fields(&self) -> &Value {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ValidationCode::SpecMismatch.code(), "SPEC_MISMATCH");
        assert_eq!(ValidationCode::SuffixInvalid.code(), "SUFFIX_INVALID");
        assert_eq!(ValidationCode::OwnershipMismatch.code(), "OWNERSHIP_MISMATCH");
        assert_eq!(
            ValidationCode::NptCompanionForbidden.code(),
            "NPT_COMPANION_FORBIDDEN"
        );
        assert_eq!(
            ValidationCode::CompanionCheckedOut.code(),
            "COMPANION_CHECKED_OUT"
        );
        assert_eq!(
            ValidationCode::ReplacementPendingQc.code(),
            "REPLACEMENT_PENDING_QC"
        );
        assert_eq!(ValidationCode::NotASpare.code(), "NOT_A_SPARE");
    }

    #[test]
    fn test_display_contains_code_and_message() {
        let err = DomainValidationError::new(
            ValidationCode::SpecMismatch,
            "thread_class differs",
            json!({"field": "thread_class"}),
        );
        let display = err.to_string();
        assert!(display.contains("SPEC_MISMATCH"));
        assert!(display.contains("thread_class differs"));
    }

    #[test]
    fn test_fields_carry_offending_values() {
        let err = DomainValidationError::new(
            ValidationCode::SuffixInvalid,
            "duplicate GO suffix",
            json!({"suffix_a": "GO", "suffix_b": "GO"}),
        );
        assert_eq!(err.fields()["suffix_a"], "GO");
        assert_eq!(err.fields()["suffix_b"], "GO");
    }
}
