//! Persistence of slot assignments in a local sqlite database

pub mod db;
pub mod error;
pub mod records;
pub(crate) mod schema;

pub use records::{RecordStore, SlotStore};
