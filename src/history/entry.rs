//! History entry vocabulary

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gauge::{GaugeId, UserId};

/// Relationship-changing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Both members created as a new pair.
    CreatedTogether,
    /// Two existing spares were linked.
    PairedFromSpares,
    /// An existing pair was split.
    Unlinked,
    /// One member was swapped for a replacement.
    Replaced,
    /// A status change was propagated across the pair.
    CascadedStatus,
    /// A location change was propagated across the pair.
    CascadedLocation,
    /// One member was deleted, leaving the other a spare.
    Orphaned,
}

impl HistoryAction {
    /// Returns the action tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::CreatedTogether => "created_together",
            HistoryAction::PairedFromSpares => "paired_from_spares",
            HistoryAction::Unlinked => "unlinked",
            HistoryAction::Replaced => "replaced",
            HistoryAction::CascadedStatus => "cascaded_status",
            HistoryAction::CascadedLocation => "cascaded_location",
            HistoryAction::Orphaned => "orphaned",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single append-only history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// First gauge involved.
    pub gauge_a: GaugeId,
    /// Second gauge involved.
    pub gauge_b: GaugeId,
    /// What happened.
    pub action: HistoryAction,
    /// Who asked for it.
    pub user_id: UserId,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
    /// Optional free-text reason supplied by the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Action-specific detail.
    pub metadata: serde_json::Value,
}

impl HistoryEntry {
    /// Creates an entry stamped now.
    pub fn new(
        gauge_a: GaugeId,
        gauge_b: GaugeId,
        action: HistoryAction,
        user_id: UserId,
        reason: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            gauge_a,
            gauge_b,
            action,
            user_id,
            timestamp: Utc::now(),
            reason,
            metadata,
        }
    }

    /// Whether the entry references the given gauge.
    pub fn involves(&self, id: GaugeId) -> bool {
        self.gauge_a == id || self.gauge_b == id
    }
}
