//! SQLite entry store
//!
//! Each entry is stored as its JSON record in a single row keyed by date.
//! Writes go through a transaction, so a reader sees either the old record
//! or the new one.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{bare_record, normalize_entry, Entry};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};
use crate::storage::EntryStore;

/// Path label used for in-memory databases in error messages
const MEMORY_PATH: &str = ":memory:";

/// SQLite-backed [`EntryStore`]
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open or create the journal database for the given configuration
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(config.sqlite_path())
    }

    /// Open or create a journal database at a specific path
    pub fn open_path(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| StorageError::from_sqlite(e, path.clone()))?;
        Self::with_connection(conn, path)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let path = PathBuf::from(MEMORY_PATH);
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::from_sqlite(e, path.clone()))?;
        Self::with_connection(conn, path)
    }

    fn with_connection(conn: Connection, path: PathBuf) -> StorageResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn).map_err(|e| StorageError::from_sqlite(e, path.clone()))?;
        }
        debug!("Opened journal database at {:?}", path);
        Ok(Self { conn, path })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of stored entries
    pub fn count(&self) -> StorageResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .map_err(|e| self.classify(e))?;
        Ok(count as usize)
    }

    fn classify(&self, error: rusqlite::Error) -> StorageError {
        StorageError::from_sqlite(error, self.path.clone())
    }
}

impl EntryStore for SqliteStore {
    fn put(&mut self, entry: &Entry) -> StorageResult<()> {
        let record = serde_json::to_string(entry)?;
        let path = &self.path;
        let classify = |e| StorageError::from_sqlite(e, path.clone());

        let tx = self.conn.transaction().map_err(classify)?;
        tx.execute(
            r#"
            INSERT INTO entries (date, record, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(date) DO UPDATE SET
                record = excluded.record,
                updated_at = excluded.updated_at
            "#,
            params![entry.date, record, entry.updated_at.to_rfc3339()],
        )
        .map_err(classify)?;
        tx.commit().map_err(classify)?;

        debug!("Stored entry {}", entry.date);
        Ok(())
    }

    fn get(&self, date: &str) -> StorageResult<Option<Entry>> {
        let record: Option<String> = self
            .conn
            .query_row(
                "SELECT record FROM entries WHERE date = ?1",
                params![date],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| self.classify(e))?;

        Ok(record.map(|text| decode_record(date, &text)))
    }

    fn delete(&mut self, date: &str) -> StorageResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE date = ?1", params![date])
            .map_err(|e| self.classify(e))?;
        debug!("Deleted entry {} ({} row(s))", date, removed);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, record FROM entries ORDER BY date DESC")
            .map_err(|e| self.classify(e))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| self.classify(e))?;

        let mut entries = Vec::new();
        for row in rows {
            let (date, text) = row.map_err(|e| self.classify(e))?;
            entries.push(decode_record(&date, &text));
        }
        Ok(entries)
    }
}

/// Turn a stored record back into an entry
///
/// The row key wins over whatever `date` the record carries. Unreadable
/// records become a blank entry for the key.
fn decode_record(date: &str, text: &str) -> Entry {
    let mut raw = match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            warn!("Stored record for {} is not an object, repairing", date);
            bare_record(date)
        }
        Err(e) => {
            warn!("Stored record for {} is unreadable ({}), repairing", date, e);
            bare_record(date)
        }
    };

    if let Value::Object(map) = &mut raw {
        map.insert("date".to_string(), Value::String(date.to_string()));
    }
    normalize_entry(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use tempfile::TempDir;

    fn entry(date: &str, headline: &str) -> Entry {
        let mut entry = Entry::blank(date);
        entry.headline = headline.to_string();
        entry
    }

    #[test]
    fn test_put_and_get() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut original = entry("2024-06-01", "Test");
        original.items.push(Item::new("How was it?", "Good"));

        store.put(&original).unwrap();

        let loaded = store.get("2024-06-01").unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("1999-01-01").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.put(&entry("2024-06-01", "First")).unwrap();
        store.put(&entry("2024-06-01", "Second")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("2024-06-01").unwrap().unwrap().headline, "Second");
    }

    #[test]
    fn test_delete() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.put(&entry("2024-06-01", "Gone soon")).unwrap();

        store.delete("2024-06-01").unwrap();
        assert!(store.get("2024-06-01").unwrap().is_none());

        // Deleting again is a no-op
        store.delete("2024-06-01").unwrap();
    }

    #[test]
    fn test_list_newest_first() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for date in ["2024-01-01", "2024-03-05", "2024-02-10"] {
            store.put(&entry(date, date)).unwrap();
        }

        let dates: Vec<String> = store.list().unwrap().into_iter().map(|e| e.date).collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-02-10", "2024-01-01"]);
    }

    #[test]
    fn test_malformed_records_are_repaired() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO entries (date, record, updated_at) VALUES (?1, ?2, '')",
                params!["2024-01-02", r#"{"headline":"Old","mood":"8","items":"nope"}"#],
            )
            .unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO entries (date, record, updated_at) VALUES (?1, ?2, '')",
                params!["2024-01-03", "{truncated"],
            )
            .unwrap();

        let old = store.get("2024-01-02").unwrap().unwrap();
        assert_eq!(old.date, "2024-01-02");
        assert_eq!(old.headline, "Old");
        assert_eq!(old.mood, 8.0);
        assert_eq!(old.items, vec![Item::default()]);

        let broken = store.get("2024-01-03").unwrap().unwrap();
        assert_eq!(broken.date, "2024-01-03");
        assert!(broken.has_only_blank_item());

        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_key_wins_over_record_date() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO entries (date, record, updated_at) VALUES (?1, ?2, '')",
                params!["2024-05-05", r#"{"date":"1970-01-01"}"#],
            )
            .unwrap();

        assert_eq!(store.get("2024-05-05").unwrap().unwrap().date, "2024-05-05");
    }

    #[test]
    fn test_failed_put_keeps_previous_record() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.put(&entry("2024-06-01", "Kept")).unwrap();

        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_updates BEFORE UPDATE ON entries \
                 BEGIN SELECT RAISE(ABORT, 'quota exceeded'); END;",
            )
            .unwrap();

        let err = store.put(&entry("2024-06-01", "Lost")).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(store.get("2024-06-01").unwrap().unwrap().headline, "Kept");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("daybook.db");

        {
            let mut store = SqliteStore::open_path(&path).unwrap();
            store.put(&entry("2024-06-01", "Durable")).unwrap();
        }

        let store = SqliteStore::open_path(&path).unwrap();
        assert_eq!(store.get("2024-06-01").unwrap().unwrap().headline, "Durable");
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_open_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daybook.db");
        fs::write(&path, "this is not a sqlite database\n".repeat(100)).unwrap();

        let err = SqliteStore::open_path(&path).err().unwrap();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
