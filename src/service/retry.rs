//! Bounded retry for transient persistence failures
//!
//! Lock-wait timeouts, detected deadlocks, and lock-time conflicts are
//! retried with exponentially increasing backoff. Domain rejections and
//! not-found failures are never retried.

use std::thread;

use crate::config::RetryPolicy;
use crate::observability::{Event, Logger};

use super::errors::{EngineError, EngineResult};

/// Runs `operation` until it succeeds, fails non-transiently, or exhausts
/// the policy's attempts.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    name: &str,
    mut operation: impl FnMut() -> EngineResult<T>,
) -> EngineResult<T> {
    let mut attempt = 1u32;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let backoff = policy.backoff_for(attempt);
                Logger::warn(
                    Event::RetryAttempt.as_str(),
                    &[
                        ("operation", name),
                        ("attempt", &attempt.to_string()),
                        ("backoff_ms", &backoff.as_millis().to_string()),
                    ],
                );
                thread::sleep(backoff);
                attempt += 1;
            }
            Err(EngineError::Store(source)) if source.is_transient() => {
                Logger::error(
                    Event::RetryExhausted.as_str(),
                    &[("operation", name), ("attempts", &attempt.to_string())],
                );
                return Err(EngineError::RetriesExhausted {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::GaugeId;
    use crate::pair::{DomainValidationError, ValidationCode};
    use crate::store::StoreError;
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_success_passes_through() {
        let result: EngineResult<u32> = with_retry(&fast_policy(), "op", || Ok(7));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_transient_failure_is_retried_until_success() {
        let mut calls = 0;
        let result = with_retry(&fast_policy(), "op", || {
            calls += 1;
            if calls < 3 {
                Err(EngineError::Store(StoreError::LockTimeout(GaugeId::new(1))))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exhausted_transient_failure_surfaces_with_attempt_count() {
        let mut calls = 0;
        let result: EngineResult<()> = with_retry(&fast_policy(), "op", || {
            calls += 1;
            Err(EngineError::Store(StoreError::LockTimeout(GaugeId::new(1))))
        });
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(EngineError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_domain_rejection_is_never_retried() {
        let mut calls = 0;
        let result: EngineResult<()> = with_retry(&fast_policy(), "op", || {
            calls += 1;
            Err(EngineError::Validation(DomainValidationError::new(
                ValidationCode::NotASpare,
                "already paired",
                json!({}),
            )))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_not_found_is_never_retried() {
        let mut calls = 0;
        let result: EngineResult<()> = with_retry(&fast_policy(), "op", || {
            calls += 1;
            Err(EngineError::Store(StoreError::NotFound(GaugeId::new(9))))
        });
        assert_eq!(calls, 1);
        assert!(matches!(
            result,
            Err(EngineError::Store(StoreError::NotFound(_)))
        ));
    }
}
