//! Durable history sink
//!
//! Entries are framed on disk as:
//!
//! ```text
//! [payload_len: u32 LE][crc32: u32 LE][payload: JSON bytes]
//! ```
//!
//! Every append is flushed and synced before it is acknowledged. Every
//! load validates frame lengths and checksums; any violation aborts the
//! load with a corruption error carrying the byte offset.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crc32fast::Hasher;

use super::entry::HistoryEntry;
use super::errors::{HistoryError, HistoryResult};
use super::sink::HistorySink;

const FRAME_HEADER_LEN: u64 = 8;

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Append-only file sink with checksummed frames.
pub struct FileHistorySink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileHistorySink {
    /// Opens (or creates) the history file for appending.
    pub fn open(path: impl AsRef<Path>) -> HistoryResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// The file backing this sink.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates every frame in a history file.
    ///
    /// Returns entries in append order. A truncated frame or checksum
    /// mismatch aborts the load.
    pub fn load(path: impl AsRef<Path>) -> HistoryResult<Vec<HistoryEntry>> {
        let mut bytes = Vec::new();
        File::open(path.as_ref())?.read_to_end(&mut bytes)?;

        let mut entries = Vec::new();
        let mut offset: u64 = 0;
        let total = bytes.len() as u64;

        while offset < total {
            if total - offset < FRAME_HEADER_LEN {
                return Err(HistoryError::corruption(offset, "truncated frame header"));
            }
            let at = offset as usize;
            let payload_len =
                u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
                    as u64;
            let expected_crc = u32::from_le_bytes([
                bytes[at + 4],
                bytes[at + 5],
                bytes[at + 6],
                bytes[at + 7],
            ]);

            let payload_start = offset + FRAME_HEADER_LEN;
            if total - payload_start < payload_len {
                return Err(HistoryError::corruption(offset, "truncated frame payload"));
            }
            let payload =
                &bytes[payload_start as usize..(payload_start + payload_len) as usize];

            if compute_checksum(payload) != expected_crc {
                return Err(HistoryError::corruption(offset, "checksum mismatch"));
            }

            let entry: HistoryEntry = serde_json::from_slice(payload)?;
            entries.push(entry);
            offset = payload_start + payload_len;
        }

        Ok(entries)
    }
}

impl HistorySink for FileHistorySink {
    fn append(&self, entry: &HistoryEntry) -> HistoryResult<()> {
        let payload = serde_json::to_vec(entry)?;
        let crc = compute_checksum(&payload);

        let mut writer = self.writer.lock().map_err(|_| HistoryError::Poisoned)?;
        writer.write_all(&(payload.len() as u32).to_le_bytes())?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn entries(&self) -> HistoryResult<Vec<HistoryEntry>> {
        // flush pending frames so the read sees everything appended
        {
            let mut writer = self.writer.lock().map_err(|_| HistoryError::Poisoned)?;
            writer.flush()?;
        }
        Self::load(&self.path)
    }
}
