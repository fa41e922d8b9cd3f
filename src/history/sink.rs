//! History sink contract and in-process sink

use std::sync::RwLock;

use super::entry::HistoryEntry;
use super::errors::{HistoryError, HistoryResult};
use crate::gauge::GaugeId;

/// Append-only store for history entries.
///
/// Implementations never mutate or delete previously appended entries.
/// The log is consumable separately by audit and reporting tooling.
pub trait HistorySink: Send + Sync {
    /// Appends one entry.
    fn append(&self, entry: &HistoryEntry) -> HistoryResult<()>;

    /// All entries in append order.
    fn entries(&self) -> HistoryResult<Vec<HistoryEntry>>;

    /// Entries referencing the given gauge, in append order.
    fn entries_for(&self, id: GaugeId) -> HistoryResult<Vec<HistoryEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.involves(id))
            .collect())
    }
}

/// In-process history sink.
#[derive(Debug, Default)]
pub struct MemoryHistorySink {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl MemoryHistorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistorySink for MemoryHistorySink {
    fn append(&self, entry: &HistoryEntry) -> HistoryResult<()> {
        let mut entries = self.entries.write().map_err(|_| HistoryError::Poisoned)?;
        entries.push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> HistoryResult<Vec<HistoryEntry>> {
        let entries = self.entries.read().map_err(|_| HistoryError::Poisoned)?;
        Ok(entries.clone())
    }
}
