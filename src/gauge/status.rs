//! Gauge operational status
//!
//! Statuses transition under explicit operation calls only. Calibration-due
//! transitions are driven by the surrounding system, never by timers inside
//! this engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational status of a single gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeStatus {
    /// On the shelf and usable.
    Available,
    /// Out with a job or an operator.
    CheckedOut,
    /// Failed inspection or damaged.
    OutOfService,
    /// Calibration interval elapsed.
    CalibrationDue,
    /// Awaiting incoming quality control.
    PendingQc,
    /// Shipped to the calibration lab.
    OutForCalibration,
    /// Back from calibration, certificate not yet filed.
    PendingCertificate,
    /// Certificate filed, awaiting release to stock.
    PendingRelease,
    /// Returned from a job, not yet inspected.
    Returned,
    /// Permanently withdrawn.
    Retired,
}

impl GaugeStatus {
    /// Returns the status name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GaugeStatus::Available => "available",
            GaugeStatus::CheckedOut => "checked_out",
            GaugeStatus::OutOfService => "out_of_service",
            GaugeStatus::CalibrationDue => "calibration_due",
            GaugeStatus::PendingQc => "pending_qc",
            GaugeStatus::OutForCalibration => "out_for_calibration",
            GaugeStatus::PendingCertificate => "pending_certificate",
            GaugeStatus::PendingRelease => "pending_release",
            GaugeStatus::Returned => "returned",
            GaugeStatus::Retired => "retired",
        }
    }

    /// Whether this status permits normal use.
    pub fn is_available(&self) -> bool {
        matches!(self, GaugeStatus::Available)
    }
}

impl fmt::Display for GaugeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
