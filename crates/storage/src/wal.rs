// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable race storage
//!
//! One JSON object per line, fsynced on every append. A trailing line that
//! fails to parse is treated as a torn write from a crash and dropped.

use erg_core::Operation;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt WAL entry at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Append-only operation log
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        let log = Self::read_entries(path)?;
        if let Some(valid_len) = log.torn_at {
            // Cut the partial line so the next append starts on a fresh line
            file.set_len(valid_len)?;
        }
        let sequence = log.entries.last().map(|entry| entry.seq).unwrap_or(0);

        Ok(Self { file, sequence })
    }

    /// Append an operation to the log
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence = entry.seq;
        Ok(self.sequence)
    }

    /// Sequence number of the last appended entry
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay all operations from the log
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(Self::read_entries(path)?
            .entries
            .into_iter()
            .map(|entry| entry.op)
            .collect())
    }

    fn read_entries(path: &Path) -> Result<ReadLog, WalError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ReadLog::default()),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let mut log = ReadLog::default();
        let mut offset = 0u64;

        for (index, line) in lines.iter().enumerate() {
            let start = offset;
            offset += line.len() as u64;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(line) {
                Ok(entry) => log.entries.push(entry),
                Err(source) if index + 1 == lines.len() => {
                    tracing::warn!(line = index + 1, error = %source, "dropping torn WAL tail");
                    log.torn_at = Some(start);
                }
                Err(source) => {
                    return Err(WalError::Corrupt {
                        line: index + 1,
                        source,
                    })
                }
            }
        }

        Ok(log)
    }
}

#[derive(Default)]
struct ReadLog {
    entries: Vec<WalEntry>,
    /// Byte offset of a torn trailing line, if any
    torn_at: Option<u64>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
