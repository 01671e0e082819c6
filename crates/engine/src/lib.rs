//! Record store for SieveDB
//!
//! This crate provides the embedded database:
//! - `Database`: create/open/ephemeral, insert, enumerate, search, close
//! - `Cursor`: snapshot iteration over search results
//! - `StoreConfig` / `DatabaseOptions`: `sieve.toml` and option strings
//! - Record log format with CRC-checked frames

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cursor;
pub mod database;
pub mod format;
pub mod log;
pub mod record;
pub mod search;

pub use config::{DatabaseOptions, DurabilityMode, StoreConfig, CONFIG_FILE_NAME};
pub use cursor::Cursor;
pub use database::Database;
pub use format::{LogHeader, RecordFrame, RecordFrameError};
pub use log::{RecordLog, LOG_FILE_NAME};
pub use record::StoredRecord;
pub use search::{ScreeningOnly, SubstructureMatcher};
