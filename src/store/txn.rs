//! Explicit transaction handle
//!
//! A `Transaction` buffers row writes and history appends until commit.
//! Nothing a transaction stages is visible to readers before `commit`
//! returns, and a rolled-back or dropped handle leaves the store exactly
//! as it was. Row locks held by the handle are released on commit,
//! rollback, and drop.
//!
//! A handle that has committed or rolled back is closed; any further use
//! is a programming error, not a domain failure.

use std::collections::{BTreeSet, HashMap};

use crate::gauge::{GaugeId, GaugeRecord};
use crate::history::HistoryEntry;

use super::engine::PairStore;
use super::errors::{StoreError, StoreResult};

/// Handle for one atomic unit of work against a `PairStore`.
pub struct Transaction<'store> {
    store: &'store PairStore,
    write_set: HashMap<GaugeId, GaugeRecord>,
    history: Vec<HistoryEntry>,
    locked: BTreeSet<GaugeId>,
    open: bool,
}

impl<'store> Transaction<'store> {
    pub(super) fn new(store: &'store PairStore) -> Self {
        Self {
            store,
            write_set: HashMap::new(),
            history: Vec::new(),
            locked: BTreeSet::new(),
            open: true,
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }

    /// Whether the handle is still usable.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether this handle holds the row lock for `id`.
    pub fn holds_lock(&self, id: GaugeId) -> bool {
        self.locked.contains(&id)
    }

    /// Acquires row locks in canonical order (lowest identity first).
    ///
    /// Already-held locks are skipped, so repeated calls compose. On a
    /// timeout, locks acquired so far stay held until the handle closes.
    pub fn lock_rows(&mut self, ids: &[GaugeId]) -> StoreResult<()> {
        self.ensure_open()?;
        let wanted: BTreeSet<GaugeId> = ids.iter().copied().collect();
        for id in wanted {
            if self.locked.contains(&id) {
                continue;
            }
            self.store.acquire_lock(id)?;
            self.locked.insert(id);
        }
        Ok(())
    }

    /// Reads a row through this transaction: staged writes shadow the
    /// committed table.
    pub fn read(&self, id: GaugeId) -> StoreResult<Option<GaugeRecord>> {
        self.ensure_open()?;
        if let Some(record) = self.write_set.get(&id) {
            return Ok(Some(record.clone()));
        }
        self.store.get(id)
    }

    /// Stages a row write. The handle must hold the row's lock.
    pub fn stage(&mut self, record: GaugeRecord) -> StoreResult<()> {
        self.ensure_open()?;
        if !self.locked.contains(&record.id) {
            return Err(StoreError::LockNotHeld(record.id));
        }
        self.write_set.insert(record.id, record);
        Ok(())
    }

    /// Buffers a history entry for atomic append at commit.
    pub fn record_history(&mut self, entry: HistoryEntry) -> StoreResult<()> {
        self.ensure_open()?;
        self.history.push(entry);
        Ok(())
    }

    /// Applies every staged write and history entry atomically, then
    /// closes the handle.
    ///
    /// On error nothing is applied and the handle is still closed; the
    /// caller observes the store exactly as it was before the call.
    pub fn commit(&mut self) -> StoreResult<()> {
        self.ensure_open()?;
        let writes: Vec<GaugeRecord> = self.write_set.drain().map(|(_, r)| r).collect();
        let history = std::mem::take(&mut self.history);
        let result = self.store.apply_commit(writes, &history);
        self.close();
        result
    }

    /// Discards every staged write, releases locks, closes the handle.
    pub fn rollback(&mut self) {
        self.write_set.clear();
        self.history.clear();
        self.close();
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.store.release_locks(&self.locked);
            self.locked.clear();
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
