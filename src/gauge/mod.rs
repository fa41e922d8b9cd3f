//! Gauge Domain Types
//!
//! This module provides:
//! - `GaugeId` - Totally ordered gauge identity
//! - `GaugeRecord` - A single inspection gauge with classification,
//!   specification snapshot, and mutable operational state
//! - `GaugeStatus` - Fixed operational status enumeration
//! - `SpecSnapshot` - Equipment-type-keyed specification comparison

mod record;
mod specification;
mod status;

pub use record::{EquipmentType, GaugeDraft, GaugeId, GaugeRecord, GaugeSuffix, Ownership, UserId};
pub use specification::{SpecField, SpecSnapshot};
pub use status::GaugeStatus;
