//! Row table and lock table
//!
//! `PairStore` holds the committed rows, the row-level lock table, and the
//! history sink binding. Transactions buffer their writes and hand them
//! back through `apply_commit`, which installs rows and history together
//! under the table lock.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::gauge::{GaugeId, GaugeRecord};
use crate::history::{HistoryEntry, HistorySink};

use super::errors::{StoreError, StoreResult};
use super::txn::Transaction;

const DEFAULT_LOCK_WAIT: Duration = Duration::from_millis(500);

/// In-process transactional store for gauge rows.
pub struct PairStore {
    rows: RwLock<HashMap<GaugeId, GaugeRecord>>,
    next_id: AtomicU64,
    locked: Mutex<HashSet<GaugeId>>,
    lock_released: Condvar,
    lock_wait: Duration,
    history: Arc<dyn HistorySink>,
}

impl PairStore {
    /// Creates a store bound to the given history sink.
    pub fn new(history: Arc<dyn HistorySink>) -> Self {
        Self::with_lock_wait(history, DEFAULT_LOCK_WAIT)
    }

    /// Creates a store with an explicit lock wait timeout.
    pub fn with_lock_wait(history: Arc<dyn HistorySink>, lock_wait: Duration) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            locked: Mutex::new(HashSet::new()),
            lock_released: Condvar::new(),
            lock_wait,
            history,
        }
    }

    /// Opens a transaction handle against this store.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Allocates the next gauge identity.
    pub fn allocate_id(&self) -> GaugeId {
        GaugeId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Point-in-time read of a committed row. Takes no locks beyond the
    /// table read lock; never blocks on row locks.
    pub fn get(&self, id: GaugeId) -> StoreResult<Option<GaugeRecord>> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    /// The history sink bound to this store.
    pub fn history(&self) -> &Arc<dyn HistorySink> {
        &self.history
    }

    /// Number of committed rows, soft-deleted included.
    pub fn row_count(&self) -> StoreResult<usize> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.len())
    }

    /// Acquires one row lock, waiting up to the configured timeout.
    pub(super) fn acquire_lock(&self, id: GaugeId) -> StoreResult<()> {
        let deadline = Instant::now() + self.lock_wait;
        let mut locked = self.locked.lock().map_err(|_| StoreError::Poisoned)?;
        while locked.contains(&id) {
            let now = Instant::now();
            if now >= deadline {
                return Err(StoreError::LockTimeout(id));
            }
            let (guard, wait) = self
                .lock_released
                .wait_timeout(locked, deadline - now)
                .map_err(|_| StoreError::Poisoned)?;
            locked = guard;
            if wait.timed_out() && locked.contains(&id) {
                return Err(StoreError::LockTimeout(id));
            }
        }
        locked.insert(id);
        Ok(())
    }

    /// Releases the given row locks and wakes waiters.
    pub(super) fn release_locks(&self, ids: &BTreeSet<GaugeId>) {
        if let Ok(mut locked) = self.locked.lock() {
            for id in ids {
                locked.remove(id);
            }
        }
        self.lock_released.notify_all();
    }

    /// Installs a transaction's buffered writes and history entries.
    ///
    /// History goes to the sink first; a sink failure aborts the commit
    /// with no row change applied. Row installation itself cannot fail
    /// partially because it happens under the table write lock.
    pub(super) fn apply_commit(
        &self,
        writes: Vec<GaugeRecord>,
        history: &[HistoryEntry],
    ) -> StoreResult<()> {
        for entry in history {
            self.history
                .append(entry)
                .map_err(|e| StoreError::History(e.to_string()))?;
        }
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        for record in writes {
            rows.insert(record.id, record);
        }
        Ok(())
    }
}
