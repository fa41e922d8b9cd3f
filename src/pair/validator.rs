//! Companion-pair validation
//!
//! Pure, no I/O. Takes two candidate gauge records and either admits them
//! as a GO / NO GO pair or rejects with the first violated rule. Checks run
//! in a fixed order and stop at the first violation:
//!
//! 1. Both records are live (not soft-deleted)
//! 2. The equipment type pairs at all
//! 3. Suffixes are exactly one GO and one NOGO
//! 4. Equipment type and category are identical
//! 5. Specification snapshots agree on every comparison field
//! 6. Ownership is compatible
//! 7. Companion references are absent on both sides, or already mutual

use serde_json::json;

use crate::gauge::{GaugeRecord, GaugeSuffix};

use super::errors::{DomainValidationError, ValidationCode, ValidationResult};

/// A pair admitted by the validator.
///
/// Holds borrowed views of the two members, oriented by suffix.
#[derive(Debug)]
pub struct ValidatedPair<'a> {
    go: &'a GaugeRecord,
    no_go: &'a GaugeRecord,
}

impl<'a> ValidatedPair<'a> {
    /// The GO member.
    pub fn go(&self) -> &'a GaugeRecord {
        self.go
    }

    /// The NO GO member.
    pub fn no_go(&self) -> &'a GaugeRecord {
        self.no_go
    }
}

/// Fail-fast admission of two candidate records as a companion pair.
pub struct CompanionPairValidator;

impl CompanionPairValidator {
    /// Validates two candidates, reporting the first violation.
    pub fn validate<'a>(
        a: &'a GaugeRecord,
        b: &'a GaugeRecord,
    ) -> ValidationResult<ValidatedPair<'a>> {
        for record in [a, b] {
            if record.deleted {
                return Err(DomainValidationError::new(
                    ValidationCode::GaugeDeleted,
                    format!("gauge {} is deleted", record.display_identifier),
                    json!({
                        "gauge_id": record.id.value(),
                        "display_identifier": record.display_identifier,
                    }),
                ));
            }
        }

        for record in [a, b] {
            if !record.equipment_type.is_companionable() {
                return Err(DomainValidationError::new(
                    ValidationCode::NptCompanionForbidden,
                    format!(
                        "gauge {} is a {} and never pairs",
                        record.display_identifier, record.equipment_type
                    ),
                    json!({
                        "gauge_id": record.id.value(),
                        "equipment_type": record.equipment_type.as_str(),
                    }),
                ));
            }
        }

        let (go, no_go) = match (a.suffix, b.suffix) {
            (Some(GaugeSuffix::Go), Some(GaugeSuffix::NoGo)) => (a, b),
            (Some(GaugeSuffix::NoGo), Some(GaugeSuffix::Go)) => (b, a),
            (suffix_a, suffix_b) => {
                return Err(DomainValidationError::new(
                    ValidationCode::SuffixInvalid,
                    "suffixes must be exactly one GO and one NOGO",
                    json!({
                        "suffix_a": suffix_a.map(|s| s.as_str()),
                        "suffix_b": suffix_b.map(|s| s.as_str()),
                    }),
                ));
            }
        };

        if a.equipment_type != b.equipment_type {
            return Err(DomainValidationError::new(
                ValidationCode::TypeMismatch,
                "equipment types differ",
                json!({
                    "equipment_type_a": a.equipment_type.as_str(),
                    "equipment_type_b": b.equipment_type.as_str(),
                }),
            ));
        }

        if a.category != b.category {
            return Err(DomainValidationError::new(
                ValidationCode::CategoryMismatch,
                "categories differ",
                json!({
                    "category_a": a.category,
                    "category_b": b.category,
                }),
            ));
        }

        if let Some(field) = a
            .specification
            .first_mismatch(&b.specification, a.equipment_type)
        {
            return Err(DomainValidationError::new(
                ValidationCode::SpecMismatch,
                format!("specification field {} differs", field),
                json!({
                    "field": field.as_str(),
                    "value_a": a.specification.field(field),
                    "value_b": b.specification.field(field),
                }),
            ));
        }

        if !a.ownership.matches(&b.ownership) {
            return Err(DomainValidationError::new(
                ValidationCode::OwnershipMismatch,
                "ownership differs",
                json!({
                    "ownership_a": a.ownership.kind(),
                    "ownership_b": b.ownership.kind(),
                }),
            ));
        }

        let symmetric = match (a.companion, b.companion) {
            (None, None) => true,
            (Some(ref_a), Some(ref_b)) => ref_a == b.id && ref_b == a.id,
            _ => false,
        };
        if !symmetric {
            return Err(DomainValidationError::new(
                ValidationCode::AsymmetricLink,
                "companion references are not mutual",
                json!({
                    "gauge_a": a.id.value(),
                    "companion_a": a.companion.map(|c| c.value()),
                    "gauge_b": b.id.value(),
                    "companion_b": b.companion.map(|c| c.value()),
                }),
            ));
        }

        Ok(ValidatedPair { go, no_go })
    }
}
