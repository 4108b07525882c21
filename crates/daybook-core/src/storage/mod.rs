//! Storage layer
//!
//! Durable, date-keyed storage of journal entries.
//!
//! ## Architecture
//!
//! - **`EntryStore`**: the put/get/delete/list seam the autosave controller
//!   writes through
//! - **SQLite**: one row per date holding the full JSON record
//!
//! Stores hold records without business logic. Every record handed back to
//! a caller has been passed through `normalize_entry`.

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteStore;

use crate::models::Entry;

/// Date-keyed entry storage
pub trait EntryStore {
    /// Upsert the full record under `entry.date`
    ///
    /// Either the whole record is written or the previous one is left
    /// untouched.
    fn put(&mut self, entry: &Entry) -> StorageResult<()>;

    /// Fetch the record for `date`, or `None` when nothing is stored
    fn get(&self, date: &str) -> StorageResult<Option<Entry>>;

    /// Remove the record for `date`; succeeds when nothing is stored
    fn delete(&mut self, date: &str) -> StorageResult<()>;

    /// All records, newest date first
    fn list(&self) -> StorageResult<Vec<Entry>>;
}
