use rusqlite::Connection;

use crate::storage::error::StorageError;

pub mod tables {
    pub const SLOTS: &str = "slots";

    pub const ALL_TABLES: &[&str] = &[SLOTS];
}

pub mod columns {
    pub const SLOT: &str = "slot";
    pub const FILE_NAME: &str = "file_name";
    pub const TITLE: &str = "title";
    pub const MIME: &str = "mime";
    pub const AUDIO: &str = "audio";
}

pub use columns::*;
pub use tables::*;

/// Stored in sqlite's `user_version` pragma.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    slot TEXT NOT NULL PRIMARY KEY,
    file_name TEXT NOT NULL,
    title TEXT NOT NULL,
    mime TEXT NOT NULL,
    audio BLOB NOT NULL
);
"#;

pub fn version(conn: &Connection) -> Result<u32, rusqlite::Error> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Creates missing tables and stamps the schema version.
///
/// Databases written by a newer schema are refused rather than guessed at.
pub fn init(conn: &Connection) -> Result<(), StorageError> {
    let found = version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    conn.execute_batch(SCHEMA)?;
    if found < SCHEMA_VERSION {
        log::info!("upgrading slot database schema from v{found} to v{SCHEMA_VERSION}");
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    }
    Ok(())
}
