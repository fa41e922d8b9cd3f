//! Engine configuration
//!
//! The status priority order is ordered data, not code. The default below
//! reflects observed shop behavior; deployments can supply their own order
//! until the tie-breaks are confirmed with the domain owner.

use std::time::Duration;

use crate::gauge::GaugeStatus;

/// Total order over non-available statuses, highest priority first.
///
/// The pair-level status of a mixed pair is the member status that ranks
/// highest here. Statuses absent from the order rank below every listed
/// one.
#[derive(Debug, Clone)]
pub struct StatusPriority {
    order: Vec<GaugeStatus>,
}

impl Default for StatusPriority {
    fn default() -> Self {
        Self {
            order: vec![
                GaugeStatus::CheckedOut,
                GaugeStatus::OutOfService,
                GaugeStatus::OutForCalibration,
                GaugeStatus::PendingCertificate,
                GaugeStatus::PendingRelease,
                GaugeStatus::CalibrationDue,
                GaugeStatus::PendingQc,
            ],
        }
    }
}

impl StatusPriority {
    /// Creates a priority order from an explicit list, highest first.
    pub fn new(order: Vec<GaugeStatus>) -> Self {
        Self { order }
    }

    /// Rank of a status in the order; lower ranks win.
    pub fn rank(&self, status: GaugeStatus) -> usize {
        self.order
            .iter()
            .position(|s| *s == status)
            .unwrap_or(self.order.len())
    }
}

/// Bounded retry for transient persistence failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(20),
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep after failed attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_backoff * factor
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub status_priority: StatusPriority,
    pub retry: RetryPolicy,
}
