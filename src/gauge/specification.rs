//! Specification snapshot comparison
//!
//! Specifications are compared over an explicit, equipment-type-keyed field
//! list. Optional fields outside that list (notes, vendor references) never
//! cause a pair mismatch.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::EquipmentType;

/// A single comparable specification field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    ThreadSize,
    ThreadClass,
    ThreadForm,
    GaugeType,
    NominalDiameter,
}

impl SpecField {
    /// Returns the field name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecField::ThreadSize => "thread_size",
            SpecField::ThreadClass => "thread_class",
            SpecField::ThreadForm => "thread_form",
            SpecField::GaugeType => "gauge_type",
            SpecField::NominalDiameter => "nominal_diameter",
        }
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Equipment-type-specific specification snapshot.
///
/// All fields are optional; which ones participate in pair comparison is
/// decided by the equipment type, not by which fields happen to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_form: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gauge_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_diameter: Option<String>,
    /// Free text, never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SpecSnapshot {
    /// Builds a thread gauge specification.
    pub fn thread(
        size: impl Into<String>,
        class: impl Into<String>,
        form: impl Into<String>,
        gauge_type: impl Into<String>,
    ) -> Self {
        Self {
            thread_size: Some(size.into()),
            thread_class: Some(class.into()),
            thread_form: Some(form.into()),
            gauge_type: Some(gauge_type.into()),
            ..Self::default()
        }
    }

    /// Builds a plain (cylindrical) gauge specification.
    pub fn plain(nominal_diameter: impl Into<String>, gauge_type: impl Into<String>) -> Self {
        Self {
            nominal_diameter: Some(nominal_diameter.into()),
            gauge_type: Some(gauge_type.into()),
            ..Self::default()
        }
    }

    /// Value of a single field, if set.
    pub fn field(&self, field: SpecField) -> Option<&str> {
        match field {
            SpecField::ThreadSize => self.thread_size.as_deref(),
            SpecField::ThreadClass => self.thread_class.as_deref(),
            SpecField::ThreadForm => self.thread_form.as_deref(),
            SpecField::GaugeType => self.gauge_type.as_deref(),
            SpecField::NominalDiameter => self.nominal_diameter.as_deref(),
        }
    }

    /// Fields that participate in pair comparison for the given type.
    pub fn comparison_fields(equipment_type: EquipmentType) -> &'static [SpecField] {
        match equipment_type {
            EquipmentType::ThreadPlug | EquipmentType::ThreadRing => &[
                SpecField::ThreadSize,
                SpecField::ThreadClass,
                SpecField::ThreadForm,
                SpecField::GaugeType,
            ],
            EquipmentType::NptPlug | EquipmentType::NptRing => {
                &[SpecField::ThreadSize, SpecField::ThreadForm]
            }
            EquipmentType::PlainPlug | EquipmentType::PlainRing => {
                &[SpecField::NominalDiameter, SpecField::GaugeType]
            }
        }
    }

    /// First differing comparison field between two snapshots, if any.
    pub fn first_mismatch(
        &self,
        other: &SpecSnapshot,
        equipment_type: EquipmentType,
    ) -> Option<SpecField> {
        Self::comparison_fields(equipment_type)
            .iter()
            .copied()
            .find(|field| self.field(*field) != other.field(*field))
    }
}
