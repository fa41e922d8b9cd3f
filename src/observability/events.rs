//! Observable engine events
//!
//! Events are explicit and typed; free-form event names do not exist.

use std::fmt;

/// Observable events in the companion-pair engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Pairing
    /// A new GO / NO GO set was created.
    SetCreated,
    /// Two existing spares were linked into a set.
    SparesPaired,
    /// A set was split back into two spares.
    SetUnpaired,
    /// One member of a set was swapped for a replacement.
    CompanionReplaced,

    // Standalone lifecycle
    /// A standalone spare gauge was created.
    GaugeCreated,
    /// A gauge was soft-deleted.
    GaugeSoftDeleted,
    /// A deletion left the counterpart a spare.
    GaugeOrphaned,

    // Cascades
    /// A status change was propagated across a pair.
    StatusCascaded,
    /// A location change was propagated across a pair.
    LocationCascaded,

    // Integrity & resilience
    /// A companion pointer did not resolve cleanly.
    ConsistencyWarning,
    /// A transient persistence failure is being retried.
    RetryAttempt,
    /// Retries were exhausted; the failure is surfacing.
    RetryExhausted,
}

impl Event {
    /// Returns the event name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SetCreated => "SET_CREATED",
            Event::SparesPaired => "SPARES_PAIRED",
            Event::SetUnpaired => "SET_UNPAIRED",
            Event::CompanionReplaced => "COMPANION_REPLACED",
            Event::GaugeCreated => "GAUGE_CREATED",
            Event::GaugeSoftDeleted => "GAUGE_SOFT_DELETED",
            Event::GaugeOrphaned => "GAUGE_ORPHANED",
            Event::StatusCascaded => "STATUS_CASCADED",
            Event::LocationCascaded => "LOCATION_CASCADED",
            Event::ConsistencyWarning => "CONSISTENCY_WARNING",
            Event::RetryAttempt => "RETRY_ATTEMPT",
            Event::RetryExhausted => "RETRY_EXHAUSTED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(Event::SetCreated.as_str(), "SET_CREATED");
        assert_eq!(Event::ConsistencyWarning.as_str(), "CONSISTENCY_WARNING");
        assert_eq!(Event::RetryAttempt.as_str(), "RETRY_ATTEMPT");
    }

    #[test]
    fn test_event_display_matches_name() {
        assert_eq!(Event::GaugeOrphaned.to_string(), "GAUGE_ORPHANED");
    }
}
