//! Stored blobs made playable as temporary files.

use std::{
    io::Write,
    path::Path,
    time::{Duration, Instant},
};

use tempfile::NamedTempFile;

use crate::domain::{record::SlotRecord, slot::SlotCode};

/// A record's audio written to a temporary file. The file is removed when
/// the handle is dropped.
#[derive(Debug)]
pub struct BlobHandle {
    slot: SlotCode,
    file: NamedTempFile,
}

impl BlobHandle {
    pub fn create(record: &SlotRecord) -> std::io::Result<Self> {
        let suffix = record
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(&format!("rolodex-{}-", record.slot))
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&record.audio)?;
        file.flush()?;
        Ok(Self {
            slot: record.slot,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn slot(&self) -> SlotCode {
        self.slot
    }
}

/// Handles whose play request is over but which may still be read by the
/// output. Each one is released once its grace window has passed.
#[derive(Debug)]
pub struct ReleaseSchedule {
    grace: Duration,
    pending: Vec<(Instant, BlobHandle)>,
}

impl ReleaseSchedule {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            pending: Vec::new(),
        }
    }

    pub fn retire(&mut self, handle: BlobHandle, now: Instant) {
        log::trace!(
            "{} handle at {} released in {:?}",
            handle.slot(),
            handle.path().to_string_lossy(),
            self.grace
        );
        self.pending.push((now + self.grace, handle));
    }

    /// drops every handle whose window has passed, returns how many
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(deadline, _)| *deadline > now);
        let released = before - self.pending.len();
        if released > 0 {
            log::debug!("released {released} audio handle(s)");
        }
        released
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
