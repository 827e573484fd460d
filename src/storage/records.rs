use rusqlite::{OptionalExtension, params};

use crate::{
    config,
    domain::{record::SlotRecord, slot::SlotCode},
    storage::{
        db,
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use tables::*;

/// Persistence of slot assignments.
///
/// Every call is atomic for the slot it touches: a failed write leaves the
/// previous record in place.
pub trait RecordStore {
    /// stores the record, replacing whatever the slot held before
    fn put(&mut self, record: &SlotRecord) -> Result<(), StorageError>;

    /// `Ok(None)` when nothing is assigned to the slot
    fn get(&mut self, slot: SlotCode) -> Result<Option<SlotRecord>, StorageError>;

    /// all assigned records in catalog order
    fn get_all(&mut self) -> Result<Vec<SlotRecord>, StorageError>;

    /// returns whether anything was removed
    fn delete(&mut self, slot: SlotCode) -> Result<bool, StorageError>;

    /// returns the number of removed records
    fn clear_all(&mut self) -> Result<usize, StorageError>;

    /// Renames an existing assignment. Blank titles keep the old one.
    ///
    /// returns whether the slot had a record
    fn set_title(&mut self, slot: SlotCode, title: &str) -> Result<bool, StorageError> {
        let Some(mut record) = self.get(slot)? else {
            return Ok(false);
        };
        let title = title.trim();
        if !title.is_empty() {
            record.title = title.to_string();
            self.put(&record)?;
        }
        Ok(true)
    }
}

/// Main structure that implements slot storage on top of sqlite
pub struct SlotStore {
    pub(crate) db: rusqlite::Connection,
}

type RawRow = (String, String, String, String, Vec<u8>);

const SELECT_COLUMNS: &str = "slot, file_name, title, mime, audio";

impl SlotStore {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    fn read_row(row: &rusqlite::Row<'_>) -> Result<RawRow, rusqlite::Error> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }

    fn into_record((slot, file_name, title, mime, audio): RawRow) -> Result<SlotRecord, StorageError> {
        Ok(SlotRecord {
            slot: slot.parse()?,
            file_name,
            title,
            mime,
            audio,
        })
    }
}

impl RecordStore for SlotStore {
    fn put(&mut self, record: &SlotRecord) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;
        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO {SLOTS} ({SLOT}, {FILE_NAME}, {TITLE}, {MIME}, {AUDIO})
             VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                record.slot.to_string(),
                record.file_name,
                record.title,
                record.mime,
                record.audio
            ],
        )?;
        tx.commit()?;
        log::debug!("stored {} ({} bytes)", record.slot, record.audio.len());
        Ok(())
    }

    fn get(&mut self, slot: SlotCode) -> Result<Option<SlotRecord>, StorageError> {
        let raw = self
            .db
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM {SLOTS} WHERE {SLOT} = ?1"),
                params![slot.to_string()],
                Self::read_row,
            )
            .optional()?;

        raw.map(Self::into_record).transpose()
    }

    fn get_all(&mut self) -> Result<Vec<SlotRecord>, StorageError> {
        let tx = self.db.transaction()?;

        let rows = {
            let mut stmt = tx.prepare(&format!("SELECT {SELECT_COLUMNS} FROM {SLOTS}"))?;
            let rows = stmt
                .query_map([], Self::read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        tx.commit()?;

        let mut records = rows
            .into_iter()
            .map(Self::into_record)
            .collect::<Result<Vec<_>, StorageError>>()?;
        records.sort_by_key(|r| r.slot);
        Ok(records)
    }

    fn delete(&mut self, slot: SlotCode) -> Result<bool, StorageError> {
        let tx = self.db.transaction()?;
        let removed = tx.execute(
            &format!("DELETE FROM {SLOTS} WHERE {SLOT} = ?1"),
            params![slot.to_string()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn clear_all(&mut self) -> Result<usize, StorageError> {
        let tx = self.db.transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {SLOTS}"), [])?;
        tx.commit()?;
        Ok(removed)
    }
}
