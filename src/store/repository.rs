//! Companion repository primitives
//!
//! The only persistence operations the services may use. Every write takes
//! the caller's transaction handle as an argument; there is no ambient
//! connection to fall back to, and the handle is never stashed in shared
//! state. Link and unlink always touch both rows inside the same handle so
//! one side can never drift from the other.

use std::sync::Arc;

use serde_json::Value;

use crate::gauge::{GaugeDraft, GaugeId, GaugeRecord, GaugeStatus, GaugeSuffix, UserId};
use crate::history::{HistoryAction, HistoryEntry};

use super::engine::PairStore;
use super::errors::{StoreError, StoreResult};
use super::txn::Transaction;

/// Persistence primitives for gauges and their relationship pointers.
#[derive(Clone)]
pub struct CompanionRepository {
    store: Arc<PairStore>,
}

impl CompanionRepository {
    pub fn new(store: Arc<PairStore>) -> Self {
        Self { store }
    }

    /// The store this repository writes to.
    pub fn store(&self) -> &Arc<PairStore> {
        &self.store
    }

    /// Persists a new gauge row inside the caller's transaction.
    ///
    /// Allocates the identity, locks the new row, and stages it. The row
    /// becomes visible only when the handle commits.
    pub fn create_gauge(
        &self,
        draft: GaugeDraft,
        display_identifier: String,
        suffix: Option<GaugeSuffix>,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<GaugeRecord> {
        let id = self.store.allocate_id();
        txn.lock_rows(&[id])?;
        let record = draft.into_record(id, display_identifier, suffix);
        txn.stage(record.clone())?;
        Ok(record)
    }

    /// Sets both companion references to each other inside one handle.
    ///
    /// Both rows must already be locked by the handle.
    pub fn link_companions(
        &self,
        id_a: GaugeId,
        id_b: GaugeId,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<()> {
        let mut a = self.get_gauge_in(id_a, txn)?;
        let mut b = self.get_gauge_in(id_b, txn)?;
        a.companion = Some(id_b);
        a.touch();
        b.companion = Some(id_a);
        b.touch();
        txn.stage(a)?;
        txn.stage(b)?;
        Ok(())
    }

    /// Clears both companion references atomically.
    pub fn unpair_gauges(
        &self,
        id_a: GaugeId,
        id_b: GaugeId,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<()> {
        let mut a = self.get_gauge_in(id_a, txn)?;
        let mut b = self.get_gauge_in(id_b, txn)?;
        a.companion = None;
        a.touch();
        b.companion = None;
        b.touch();
        txn.stage(a)?;
        txn.stage(b)?;
        Ok(())
    }

    /// Updates one row's status.
    pub fn update_status(
        &self,
        id: GaugeId,
        status: GaugeStatus,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<()> {
        let mut record = self.get_gauge_in(id, txn)?;
        record.status = status;
        record.touch();
        txn.stage(record)
    }

    /// Updates one row's location.
    pub fn update_location(
        &self,
        id: GaugeId,
        location: &str,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<()> {
        let mut record = self.get_gauge_in(id, txn)?;
        record.location = location.to_string();
        record.touch();
        txn.stage(record)
    }

    /// Soft-deletes one row, clearing its companion reference.
    ///
    /// Orphaning the counterpart is the cascade service's job; the
    /// repository only guarantees a deleted row never keeps a pointer.
    pub fn soft_delete_gauge(&self, id: GaugeId, txn: &mut Transaction<'_>) -> StoreResult<()> {
        let mut record = self.get_gauge_in(id, txn)?;
        record.deleted = true;
        record.companion = None;
        record.touch();
        txn.stage(record)
    }

    /// Reads a live gauge from committed state, without a transaction.
    ///
    /// May observe a point-in-time snapshot; never the basis for a write.
    pub fn get_gauge(&self, id: GaugeId) -> StoreResult<GaugeRecord> {
        self.store
            .get(id)?
            .filter(|record| !record.deleted)
            .ok_or(StoreError::NotFound(id))
    }

    /// Reads a live gauge through the caller's transaction.
    pub fn get_gauge_in(&self, id: GaugeId, txn: &Transaction<'_>) -> StoreResult<GaugeRecord> {
        txn.read(id)?
            .filter(|record| !record.deleted)
            .ok_or(StoreError::NotFound(id))
    }

    /// Committed-state read of a gauge's companion, if it has one.
    pub fn get_companion_gauge(&self, id: GaugeId) -> StoreResult<Option<GaugeRecord>> {
        let gauge = self.get_gauge(id)?;
        match gauge.companion {
            Some(companion_id) => Ok(Some(self.get_gauge(companion_id)?)),
            None => Ok(None),
        }
    }

    /// Raw row read through the caller's transaction, soft-deleted rows
    /// included. Used for integrity probing.
    pub fn find_gauge_in(
        &self,
        id: GaugeId,
        txn: &Transaction<'_>,
    ) -> StoreResult<Option<GaugeRecord>> {
        txn.read(id)
    }

    /// Buffers a relationship history entry for atomic append at commit.
    pub fn record_history(
        &self,
        id_a: GaugeId,
        id_b: GaugeId,
        action: HistoryAction,
        user_id: UserId,
        reason: Option<String>,
        metadata: Value,
        txn: &mut Transaction<'_>,
    ) -> StoreResult<()> {
        txn.record_history(HistoryEntry::new(
            id_a, id_b, action, user_id, reason, metadata,
        ))
    }
}
