//! Gauge record entity
//!
//! A gauge record carries identity, classification, a specification
//! snapshot, a weak companion reference, and mutable operational state.
//! The companion reference is set and cleared only by the pairing and
//! cascade services.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::specification::SpecSnapshot;
use super::status::GaugeStatus;

/// Acting user identity, already authenticated by the caller.
pub type UserId = Uuid;

/// Stable numeric identity for a gauge record.
///
/// Ordering is total. Canonical lock acquisition always locks the lower
/// identity first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GaugeId(u64);

impl GaugeId {
    /// Creates a gauge identity from its numeric value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GaugeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Equipment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    ThreadPlug,
    ThreadRing,
    /// Tapered pipe thread plug. Inspects alone.
    NptPlug,
    /// Tapered pipe thread ring. Inspects alone.
    NptRing,
    PlainPlug,
    PlainRing,
}

impl EquipmentType {
    /// Whether gauges of this type form GO / NO GO pairs.
    ///
    /// NPT taper gauges check the thread by hand-tight standoff and never
    /// carry a companion in either direction.
    pub fn is_companionable(&self) -> bool {
        !matches!(self, EquipmentType::NptPlug | EquipmentType::NptRing)
    }

    /// Returns the type name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::ThreadPlug => "thread_plug",
            EquipmentType::ThreadRing => "thread_ring",
            EquipmentType::NptPlug => "npt_plug",
            EquipmentType::NptRing => "npt_ring",
            EquipmentType::PlainPlug => "plain_plug",
            EquipmentType::PlainRing => "plain_ring",
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// GO / NOGO suffix on thread gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GaugeSuffix {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "NOGO")]
    NoGo,
}

impl GaugeSuffix {
    /// Returns the suffix string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GaugeSuffix::Go => "GO",
            GaugeSuffix::NoGo => "NOGO",
        }
    }

    /// The other half of a pair.
    pub fn opposite(&self) -> GaugeSuffix {
        match self {
            GaugeSuffix::Go => GaugeSuffix::NoGo,
            GaugeSuffix::NoGo => GaugeSuffix::Go,
        }
    }
}

impl fmt::Display for GaugeSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who owns the gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ownership {
    Company,
    Employee { owner_id: Uuid },
    Customer { customer_id: Uuid },
}

impl Ownership {
    /// Returns the ownership kind string.
    pub fn kind(&self) -> &'static str {
        match self {
            Ownership::Company => "company",
            Ownership::Employee { .. } => "employee",
            Ownership::Customer { .. } => "customer",
        }
    }

    /// Whether two gauges may be paired under these ownerships.
    ///
    /// Kinds must match. Customer-owned gauges must also belong to the
    /// same customer.
    pub fn matches(&self, other: &Ownership) -> bool {
        match (self, other) {
            (Ownership::Company, Ownership::Company) => true,
            (Ownership::Employee { .. }, Ownership::Employee { .. }) => true,
            (
                Ownership::Customer { customer_id: a },
                Ownership::Customer { customer_id: b },
            ) => a == b,
            _ => false,
        }
    }
}

/// A single inspection gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeRecord {
    pub id: GaugeId,
    /// Display identifier; format owned by the identifier allocator.
    pub display_identifier: String,
    pub equipment_type: EquipmentType,
    pub category: String,
    /// Present on thread gauges, absent on single gauges.
    pub suffix: Option<GaugeSuffix>,
    pub specification: SpecSnapshot,
    /// Weak pointer to the paired counterpart. `None` means spare.
    pub companion: Option<GaugeId>,
    pub status: GaugeStatus,
    pub sealed: bool,
    pub location: String,
    pub ownership: Ownership,
    /// Soft-deleted records never participate in a pair.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GaugeRecord {
    /// A gauge with no companion reference.
    pub fn is_spare(&self) -> bool {
        self.companion.is_none()
    }

    /// Bumps the update timestamp after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input for creating a gauge.
///
/// Identity and display identifier are assigned at persistence time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeDraft {
    pub equipment_type: EquipmentType,
    pub category: String,
    pub specification: SpecSnapshot,
    pub status: GaugeStatus,
    pub sealed: bool,
    pub location: String,
    pub ownership: Ownership,
}

impl GaugeDraft {
    /// Materializes the draft into a stored record.
    pub fn into_record(
        self,
        id: GaugeId,
        display_identifier: String,
        suffix: Option<GaugeSuffix>,
    ) -> GaugeRecord {
        let now = Utc::now();
        GaugeRecord {
            id,
            display_identifier,
            equipment_type: self.equipment_type,
            category: self.category,
            suffix,
            specification: self.specification,
            companion: None,
            status: self.status,
            sealed: self.sealed,
            location: self.location,
            ownership: self.ownership,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
