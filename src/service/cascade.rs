//! Cascade workflows
//!
//! Propagates status changes, location changes, and deletion across a
//! pair. A gauge with no companion simply applies the change to itself.
//! A companion pointer that does not resolve cleanly raises a
//! `ConsistencyWarning` and the change still lands on the record that is
//! present; a detected inconsistency never fails the whole operation.

use serde_json::json;

use crate::config::EngineConfig;
use crate::gauge::{GaugeId, GaugeRecord, GaugeStatus, UserId};
use crate::history::HistoryAction;
use crate::observability::{Event, Logger};
use crate::pair::{DomainValidationError, ValidationCode};
use crate::store::{CompanionRepository, StoreError, Transaction};

use super::errors::{ConsistencyIssue, ConsistencyWarning, EngineResult};
use super::retry::with_retry;

/// Outcome of a status or location cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Rows the change was applied to.
    pub updated: Vec<GaugeId>,
    /// Raised when the companion pointer did not resolve cleanly.
    pub warning: Option<ConsistencyWarning>,
}

/// Outcome of a delete-and-orphan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: GaugeId,
    /// The counterpart that became a spare, when one existed.
    pub orphaned: Option<GaugeId>,
    pub warning: Option<ConsistencyWarning>,
}

/// How a locked companion pointer resolved.
enum CompanionProbe {
    /// Companion present and pointing back.
    Linked(GaugeRecord),
    /// Pointer present but broken one way or another.
    Broken(ConsistencyWarning),
}

/// Propagates side effects across a pair.
pub struct CascadeService {
    repo: CompanionRepository,
    config: EngineConfig,
}

impl CascadeService {
    pub fn new(repo: CompanionRepository, config: EngineConfig) -> Self {
        Self { repo, config }
    }

    /// Applies a status change to a gauge and its companion.
    ///
    /// Only `out_of_service` and `available` cascade; everything else is
    /// owned by narrower workflows.
    pub fn cascade_status_change(
        &self,
        gauge_id: GaugeId,
        new_status: GaugeStatus,
        user_id: UserId,
        reason: Option<&str>,
    ) -> EngineResult<CascadeOutcome> {
        if !matches!(
            new_status,
            GaugeStatus::OutOfService | GaugeStatus::Available
        ) {
            return Err(DomainValidationError::new(
                ValidationCode::StatusNotCascadable,
                format!("status {} does not cascade", new_status),
                json!({ "requested_status": new_status.as_str() }),
            )
            .into());
        }

        let outcome = with_retry(&self.config.retry, "cascade_status_change", || {
            self.propagate(
                gauge_id,
                user_id,
                reason,
                HistoryAction::CascadedStatus,
                json!({ "new_status": new_status.as_str() }),
                |repo, id, txn| repo.update_status(id, new_status, txn),
            )
        })?;

        Logger::info(
            Event::StatusCascaded.as_str(),
            &[
                ("gauge_id", &gauge_id.to_string()),
                ("new_status", new_status.as_str()),
                ("rows_updated", &outcome.updated.len().to_string()),
            ],
        );
        Ok(outcome)
    }

    /// Applies a location change to a gauge and its companion.
    pub fn cascade_location_change(
        &self,
        gauge_id: GaugeId,
        new_location: &str,
        user_id: UserId,
        reason: Option<&str>,
    ) -> EngineResult<CascadeOutcome> {
        let outcome = with_retry(&self.config.retry, "cascade_location_change", || {
            self.propagate(
                gauge_id,
                user_id,
                reason,
                HistoryAction::CascadedLocation,
                json!({ "new_location": new_location }),
                |repo, id, txn| repo.update_location(id, new_location, txn),
            )
        })?;

        Logger::info(
            Event::LocationCascaded.as_str(),
            &[
                ("gauge_id", &gauge_id.to_string()),
                ("new_location", new_location),
                ("rows_updated", &outcome.updated.len().to_string()),
            ],
        );
        Ok(outcome)
    }

    /// Soft-deletes a gauge, leaving its companion a spare.
    ///
    /// Refuses with zero mutation when the companion is checked out.
    pub fn delete_gauge_and_orphan_companion(
        &self,
        gauge_id: GaugeId,
        user_id: UserId,
        reason: Option<&str>,
    ) -> EngineResult<DeleteOutcome> {
        let outcome = with_retry(&self.config.retry, "delete_gauge_and_orphan_companion", || {
            let gauge = self.repo.get_gauge(gauge_id)?;

            let Some(companion_id) = gauge.companion else {
                let mut txn = self.repo.store().begin();
                txn.lock_rows(&[gauge_id])?;
                let gauge = self.repo.get_gauge_in(gauge_id, &txn)?;
                if gauge.companion.is_some() {
                    return Err(StoreError::Conflict(gauge_id).into());
                }
                self.repo.soft_delete_gauge(gauge_id, &mut txn)?;
                txn.commit()?;
                return Ok(DeleteOutcome {
                    deleted: gauge_id,
                    orphaned: None,
                    warning: None,
                });
            };

            let mut txn = self.repo.store().begin();
            txn.lock_rows(&[gauge_id, companion_id])?;

            let gauge = self.repo.get_gauge_in(gauge_id, &txn)?;
            if gauge.companion != Some(companion_id) {
                return Err(StoreError::Conflict(gauge_id).into());
            }

            match self.probe_companion(gauge_id, companion_id, &txn)? {
                CompanionProbe::Linked(companion) => {
                    if companion.status == GaugeStatus::CheckedOut {
                        return Err(DomainValidationError::new(
                            ValidationCode::CompanionCheckedOut,
                            format!(
                                "companion {} is checked out",
                                companion.display_identifier
                            ),
                            json!({
                                "companion_id": companion.id.value(),
                                "status": companion.status.as_str(),
                            }),
                        )
                        .into());
                    }
                    self.repo.unpair_gauges(gauge_id, companion_id, &mut txn)?;
                    self.repo.soft_delete_gauge(gauge_id, &mut txn)?;
                    self.repo.record_history(
                        gauge_id,
                        companion_id,
                        HistoryAction::Orphaned,
                        user_id,
                        reason.map(str::to_string),
                        json!({ "deleted_gauge": gauge_id.value() }),
                        &mut txn,
                    )?;
                    txn.commit()?;
                    Ok(DeleteOutcome {
                        deleted: gauge_id,
                        orphaned: Some(companion_id),
                        warning: None,
                    })
                }
                CompanionProbe::Broken(warning) => {
                    // the pointer is already wrong; delete what is present
                    self.repo.soft_delete_gauge(gauge_id, &mut txn)?;
                    txn.commit()?;
                    warning.log();
                    Ok(DeleteOutcome {
                        deleted: gauge_id,
                        orphaned: None,
                        warning: Some(warning),
                    })
                }
            }
        })?;

        Logger::info(
            Event::GaugeSoftDeleted.as_str(),
            &[("gauge_id", &gauge_id.to_string())],
        );
        if let Some(orphaned_id) = outcome.orphaned {
            Logger::info(
                Event::GaugeOrphaned.as_str(),
                &[
                    ("deleted_id", &gauge_id.to_string()),
                    ("orphaned_id", &orphaned_id.to_string()),
                ],
            );
        }
        Ok(outcome)
    }

    /// Shared propagation skeleton for status and location cascades.
    ///
    /// The history entry is written only when both members were updated.
    fn propagate(
        &self,
        gauge_id: GaugeId,
        user_id: UserId,
        reason: Option<&str>,
        action: HistoryAction,
        metadata: serde_json::Value,
        apply: impl Fn(&CompanionRepository, GaugeId, &mut Transaction<'_>) -> Result<(), StoreError>,
    ) -> EngineResult<CascadeOutcome> {
        let gauge = self.repo.get_gauge(gauge_id)?;

        let Some(companion_id) = gauge.companion else {
            let mut txn = self.repo.store().begin();
            txn.lock_rows(&[gauge_id])?;
            let gauge = self.repo.get_gauge_in(gauge_id, &txn)?;
            if gauge.companion.is_some() {
                return Err(StoreError::Conflict(gauge_id).into());
            }
            apply(&self.repo, gauge_id, &mut txn)?;
            txn.commit()?;
            return Ok(CascadeOutcome {
                updated: vec![gauge_id],
                warning: None,
            });
        };

        let mut txn = self.repo.store().begin();
        txn.lock_rows(&[gauge_id, companion_id])?;

        let gauge = self.repo.get_gauge_in(gauge_id, &txn)?;
        if gauge.companion != Some(companion_id) {
            return Err(StoreError::Conflict(gauge_id).into());
        }

        match self.probe_companion(gauge_id, companion_id, &txn)? {
            CompanionProbe::Linked(_) => {
                apply(&self.repo, gauge_id, &mut txn)?;
                apply(&self.repo, companion_id, &mut txn)?;
                self.repo.record_history(
                    gauge_id,
                    companion_id,
                    action,
                    user_id,
                    reason.map(str::to_string),
                    metadata,
                    &mut txn,
                )?;
                txn.commit()?;
                Ok(CascadeOutcome {
                    updated: vec![gauge_id, companion_id],
                    warning: None,
                })
            }
            CompanionProbe::Broken(warning) => {
                apply(&self.repo, gauge_id, &mut txn)?;
                txn.commit()?;
                warning.log();
                Ok(CascadeOutcome {
                    updated: vec![gauge_id],
                    warning: Some(warning),
                })
            }
        }
    }

    /// Resolves a locked companion pointer to the record behind it.
    fn probe_companion(
        &self,
        gauge_id: GaugeId,
        companion_id: GaugeId,
        txn: &Transaction<'_>,
    ) -> EngineResult<CompanionProbe> {
        match self.repo.find_gauge_in(companion_id, txn)? {
            None => Ok(CompanionProbe::Broken(ConsistencyWarning::new(
                gauge_id,
                companion_id,
                ConsistencyIssue::MissingCompanionRecord,
            ))),
            Some(companion) if companion.deleted => {
                Ok(CompanionProbe::Broken(ConsistencyWarning::new(
                    gauge_id,
                    companion_id,
                    ConsistencyIssue::MissingCompanionRecord,
                )))
            }
            Some(companion) if companion.companion != Some(gauge_id) => {
                Ok(CompanionProbe::Broken(ConsistencyWarning::new(
                    gauge_id,
                    companion_id,
                    ConsistencyIssue::AsymmetricLink,
                )))
            }
            Some(companion) => Ok(CompanionProbe::Linked(companion)),
        }
    }
}
