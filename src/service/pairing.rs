//! Pairing workflows
//!
//! Owns the transaction boundary for create, pair, unpair, and replace.
//! Each method opens exactly one transaction, threads the handle through
//! every repository call, and commits only after the validator accepted
//! the pair. Anything a writer learned from an unlocked read is confirmed
//! again under lock before it is acted on.

use std::sync::Arc;

use serde_json::json;

use crate::config::EngineConfig;
use crate::gauge::{GaugeDraft, GaugeId, GaugeRecord, GaugeStatus, GaugeSuffix, UserId};
use crate::history::HistoryAction;
use crate::idents::IdentifierAllocator;
use crate::observability::{Event, Logger};
use crate::pair::{
    checkout_permitted, compute_seal_status, compute_set_status, CompanionPairValidator,
    DomainValidationError, ValidationCode,
};
use crate::store::{CompanionRepository, StoreError};

use super::errors::EngineResult;
use super::retry::with_retry;

/// Read-only checkout answer with a human-readable reason when blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl CheckoutDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Result of `unpair_set`. Single gauges need no unpairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpairOutcome {
    Unpaired { gauge: GaugeId, companion: GaugeId },
    NotPaired,
}

/// Orchestrates the companion pairing workflows.
pub struct PairingService {
    repo: CompanionRepository,
    idents: Arc<dyn IdentifierAllocator>,
    config: EngineConfig,
}

impl PairingService {
    pub fn new(
        repo: CompanionRepository,
        idents: Arc<dyn IdentifierAllocator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            idents,
            config,
        }
    }

    /// Creates a GO / NO GO pair in one transaction.
    ///
    /// Identifiers come from the allocator, suffixes are explicit, and the
    /// pair is validated before anything is linked. Returns both records
    /// with companion references populated.
    pub fn create_gauge_set(
        &self,
        go_draft: GaugeDraft,
        no_go_draft: GaugeDraft,
        user_id: UserId,
    ) -> EngineResult<(GaugeRecord, GaugeRecord)> {
        with_retry(&self.config.retry, "create_gauge_set", || {
            let (go_ident, no_go_ident) = self.idents.next_set_identifiers(&go_draft.category);

            let mut txn = self.repo.store().begin();
            let go = self.repo.create_gauge(
                go_draft.clone(),
                go_ident,
                Some(GaugeSuffix::Go),
                &mut txn,
            )?;
            let no_go = self.repo.create_gauge(
                no_go_draft.clone(),
                no_go_ident,
                Some(GaugeSuffix::NoGo),
                &mut txn,
            )?;

            CompanionPairValidator::validate(&go, &no_go)?;

            self.repo.link_companions(go.id, no_go.id, &mut txn)?;
            self.repo.record_history(
                go.id,
                no_go.id,
                HistoryAction::CreatedTogether,
                user_id,
                None,
                json!({
                    "go_identifier": go.display_identifier,
                    "no_go_identifier": no_go.display_identifier,
                }),
                &mut txn,
            )?;

            let go = self.repo.get_gauge_in(go.id, &txn)?;
            let no_go = self.repo.get_gauge_in(no_go.id, &txn)?;
            txn.commit()?;

            Logger::info(
                Event::SetCreated.as_str(),
                &[
                    ("go_id", &go.id.to_string()),
                    ("no_go_id", &no_go.id.to_string()),
                    ("category", &go.category),
                ],
            );
            Ok((go, no_go))
        })
    }

    /// Creates a standalone spare gauge.
    ///
    /// No relationship changes, so no history entry is written.
    pub fn create_spare_gauge(
        &self,
        draft: GaugeDraft,
        suffix: Option<GaugeSuffix>,
        _user_id: UserId,
    ) -> EngineResult<GaugeRecord> {
        with_retry(&self.config.retry, "create_spare_gauge", || {
            let identifier = self.idents.next_identifier(&draft.category, suffix);
            let mut txn = self.repo.store().begin();
            let record = self
                .repo
                .create_gauge(draft.clone(), identifier, suffix, &mut txn)?;
            txn.commit()?;

            Logger::info(
                Event::GaugeCreated.as_str(),
                &[
                    ("gauge_id", &record.id.to_string()),
                    ("category", &record.category),
                ],
            );
            Ok(record)
        })
    }

    /// Links two existing spares into a set and moves both to the set
    /// location.
    pub fn pair_spare_gauges(
        &self,
        id_a: GaugeId,
        id_b: GaugeId,
        user_id: UserId,
        set_location: &str,
    ) -> EngineResult<(GaugeRecord, GaugeRecord)> {
        with_retry(&self.config.retry, "pair_spare_gauges", || {
            let mut txn = self.repo.store().begin();
            txn.lock_rows(&[id_a, id_b])?;

            let a = self.repo.get_gauge_in(id_a, &txn)?;
            let b = self.repo.get_gauge_in(id_b, &txn)?;

            for record in [&a, &b] {
                if let Some(companion) = record.companion {
                    return Err(DomainValidationError::new(
                        ValidationCode::NotASpare,
                        format!(
                            "gauge {} already has companion {}",
                            record.display_identifier, companion
                        ),
                        json!({
                            "gauge_id": record.id.value(),
                            "companion_id": companion.value(),
                        }),
                    )
                    .into());
                }
            }

            CompanionPairValidator::validate(&a, &b)?;

            self.repo.link_companions(id_a, id_b, &mut txn)?;
            self.repo.update_location(id_a, set_location, &mut txn)?;
            self.repo.update_location(id_b, set_location, &mut txn)?;
            self.repo.record_history(
                id_a,
                id_b,
                HistoryAction::PairedFromSpares,
                user_id,
                None,
                json!({ "set_location": set_location }),
                &mut txn,
            )?;

            let a = self.repo.get_gauge_in(id_a, &txn)?;
            let b = self.repo.get_gauge_in(id_b, &txn)?;
            txn.commit()?;

            Logger::info(
                Event::SparesPaired.as_str(),
                &[
                    ("gauge_a", &a.id.to_string()),
                    ("gauge_b", &b.id.to_string()),
                    ("set_location", set_location),
                ],
            );
            Ok((a, b))
        })
    }

    /// Splits a set back into two spares.
    ///
    /// A gauge with no companion is a no-op success.
    pub fn unpair_set(
        &self,
        gauge_id: GaugeId,
        user_id: UserId,
        reason: Option<&str>,
    ) -> EngineResult<UnpairOutcome> {
        with_retry(&self.config.retry, "unpair_set", || {
            let gauge = self.repo.get_gauge(gauge_id)?;
            let Some(companion_id) = gauge.companion else {
                return Ok(UnpairOutcome::NotPaired);
            };

            let mut txn = self.repo.store().begin();
            txn.lock_rows(&[gauge_id, companion_id])?;

            // confirm what the unlocked read promised
            let gauge = self.repo.get_gauge_in(gauge_id, &txn)?;
            match gauge.companion {
                None => return Ok(UnpairOutcome::NotPaired),
                Some(current) if current != companion_id => {
                    return Err(StoreError::Conflict(gauge_id).into());
                }
                Some(_) => {}
            }

            self.repo.unpair_gauges(gauge_id, companion_id, &mut txn)?;
            self.repo.record_history(
                gauge_id,
                companion_id,
                HistoryAction::Unlinked,
                user_id,
                reason.map(str::to_string),
                json!({}),
                &mut txn,
            )?;
            txn.commit()?;

            Logger::info(
                Event::SetUnpaired.as_str(),
                &[
                    ("gauge_id", &gauge_id.to_string()),
                    ("companion_id", &companion_id.to_string()),
                ],
            );
            Ok(UnpairOutcome::Unpaired {
                gauge: gauge_id,
                companion: companion_id,
            })
        })
    }

    /// Swaps the companion of an existing pair member for a replacement
    /// spare, moving the replacement to the set's location.
    pub fn replace_companion(
        &self,
        existing_id: GaugeId,
        replacement_id: GaugeId,
        user_id: UserId,
        reason: Option<&str>,
    ) -> EngineResult<(GaugeRecord, GaugeRecord)> {
        with_retry(&self.config.retry, "replace_companion", || {
            let existing = self.repo.get_gauge(existing_id)?;
            let Some(old_companion_id) = existing.companion else {
                return Err(DomainValidationError::new(
                    ValidationCode::NotPaired,
                    format!("gauge {} has no companion", existing.display_identifier),
                    json!({ "gauge_id": existing_id.value() }),
                )
                .into());
            };

            let mut txn = self.repo.store().begin();
            txn.lock_rows(&[existing_id, old_companion_id, replacement_id])?;

            let existing = self.repo.get_gauge_in(existing_id, &txn)?;
            if existing.companion != Some(old_companion_id) {
                return Err(StoreError::Conflict(existing_id).into());
            }
            let old_companion = self.repo.get_gauge_in(old_companion_id, &txn)?;
            let replacement = self.repo.get_gauge_in(replacement_id, &txn)?;

            for record in [&existing, &old_companion] {
                if record.status == GaugeStatus::CheckedOut {
                    return Err(DomainValidationError::new(
                        ValidationCode::CompanionCheckedOut,
                        format!("gauge {} is checked out", record.display_identifier),
                        json!({
                            "gauge_id": record.id.value(),
                            "status": record.status.as_str(),
                        }),
                    )
                    .into());
                }
            }
            if replacement.status == GaugeStatus::PendingQc {
                return Err(DomainValidationError::new(
                    ValidationCode::ReplacementPendingQc,
                    format!(
                        "replacement {} has not cleared QC",
                        replacement.display_identifier
                    ),
                    json!({
                        "gauge_id": replacement.id.value(),
                        "status": replacement.status.as_str(),
                    }),
                )
                .into());
            }
            if let Some(companion) = replacement.companion {
                return Err(DomainValidationError::new(
                    ValidationCode::NotASpare,
                    format!(
                        "replacement {} already has companion {}",
                        replacement.display_identifier, companion
                    ),
                    json!({
                        "gauge_id": replacement.id.value(),
                        "companion_id": companion.value(),
                    }),
                )
                .into());
            }

            self.repo
                .unpair_gauges(existing_id, old_companion_id, &mut txn)?;

            let cleared = self.repo.get_gauge_in(existing_id, &txn)?;
            CompanionPairValidator::validate(&cleared, &replacement)?;

            self.repo
                .link_companions(existing_id, replacement_id, &mut txn)?;
            self.repo
                .update_location(replacement_id, &existing.location, &mut txn)?;
            self.repo.record_history(
                existing_id,
                replacement_id,
                HistoryAction::Replaced,
                user_id,
                reason.map(str::to_string),
                json!({ "previous_companion": old_companion_id.value() }),
                &mut txn,
            )?;

            let existing = self.repo.get_gauge_in(existing_id, &txn)?;
            let replacement = self.repo.get_gauge_in(replacement_id, &txn)?;
            txn.commit()?;

            Logger::info(
                Event::CompanionReplaced.as_str(),
                &[
                    ("gauge_id", &existing_id.to_string()),
                    ("replacement_id", &replacement_id.to_string()),
                    ("previous_companion", &old_companion_id.to_string()),
                ],
            );
            Ok((existing, replacement))
        })
    }

    /// Pair-level status for the set containing `gauge_id`, derived on
    /// read. A single gauge reports its own status.
    pub fn set_status(&self, gauge_id: GaugeId) -> EngineResult<GaugeStatus> {
        let gauge = self.repo.get_gauge(gauge_id)?;
        let Some(companion_id) = gauge.companion else {
            return Ok(gauge.status);
        };
        let companion = self.repo.get_gauge(companion_id)?;
        Ok(compute_set_status(
            gauge.status,
            companion.status,
            &self.config.status_priority,
        ))
    }

    /// Pair-level seal state, derived on read. Sealed if either member is
    /// sealed.
    pub fn seal_status(&self, gauge_id: GaugeId) -> EngineResult<bool> {
        let gauge = self.repo.get_gauge(gauge_id)?;
        let Some(companion_id) = gauge.companion else {
            return Ok(gauge.sealed);
        };
        let companion = self.repo.get_gauge(companion_id)?;
        Ok(compute_seal_status(gauge.sealed, companion.sealed))
    }

    /// Whether the set containing `gauge_id` may be checked out.
    ///
    /// Read-only; takes no locks and may observe a point-in-time
    /// snapshot.
    pub fn can_checkout_set(&self, gauge_id: GaugeId) -> EngineResult<CheckoutDecision> {
        let gauge = self.repo.get_gauge(gauge_id)?;

        let Some(companion_id) = gauge.companion else {
            if gauge.status.is_available() {
                return Ok(CheckoutDecision::allowed());
            }
            return Ok(CheckoutDecision::blocked(format!(
                "gauge {} is {}",
                gauge.display_identifier, gauge.status
            )));
        };

        let companion = match self.repo.get_gauge(companion_id) {
            Ok(companion) => companion,
            Err(StoreError::NotFound(_)) => {
                return Ok(CheckoutDecision::blocked(format!(
                    "companion {} is missing",
                    companion_id
                )));
            }
            Err(err) => return Err(err.into()),
        };

        if checkout_permitted(gauge.status, companion.status) {
            return Ok(CheckoutDecision::allowed());
        }
        if !gauge.status.is_available() {
            return Ok(CheckoutDecision::blocked(format!(
                "gauge {} is {}",
                gauge.display_identifier, gauge.status
            )));
        }
        Ok(CheckoutDecision::blocked(format!(
            "companion {} is {}",
            companion.display_identifier, companion.status
        )))
    }
}
