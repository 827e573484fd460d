use thiserror::Error;

use crate::domain::slot::SlotParseError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("invalid slot stored in database: {0}")]
    InvalidSlot(#[from] SlotParseError),

    #[error("database schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema { found: u32, supported: u32 },
}
